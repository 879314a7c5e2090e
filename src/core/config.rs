//! Configuration management for the tutor
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/mathtutor/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::core::error::{Result, TutorError};

/// Main configuration for the tutor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which model backend to talk to
    #[serde(default)]
    pub provider: ProviderType,
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// OpenAI-compatible endpoint configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Agent configuration
    pub agent: AgentConfig,
    /// Streaming configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Local Ollama server
    Ollama,
    /// OpenAI or any OpenAI-compatible server
    OpenAi,
}

impl Default for ProviderType {
    fn default() -> Self {
        env::var("MATHTUTOR_PROVIDER")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(ProviderType::Ollama)
    }
}

impl FromStr for ProviderType {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderType::Ollama),
            "openai" => Ok(ProviderType::OpenAi),
            other => Err(TutorError::config(format!(
                "Unknown provider '{}'. Expected 'ollama' or 'openai'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::OpenAi => write!(f, "openai"),
        }
    }
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL without the `/v1` suffix
    pub base_url: String,
    /// API key, usually taken from OPENAI_API_KEY. Never written to disk.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used by the reasoning agent
    pub name: String,
    /// Sampling temperature; 0 keeps the reasoning format stable
    pub temperature: f32,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of recent exchanges (question + answer) kept in the prompt
    /// Default: 1
    pub memory_window: usize,
    /// Maximum model calls per question before forcing an answer
    /// Default: 4
    pub max_iterations: usize,
    /// Whether to log prompts and raw model output
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            memory_window: 1,
            max_iterations: 4,
            debug: env_flag("MATHTUTOR_DEBUG").unwrap_or(false),
        }
    }
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Whether to show the model's reasoning as it is generated
    pub enabled: bool,
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Interpreter used by the Python tool
    pub python_command: String,
    /// Seconds before a Python snippet is killed
    pub python_timeout_secs: u64,
    /// MediaWiki API endpoint used by the Wikipedia tool
    pub wikipedia_url: String,
    /// Instant-answer endpoint used by the Search tool
    pub search_url: String,
    /// Observations longer than this are truncated
    pub max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
            model: ModelConfig::default(),
            agent: AgentConfig::default(),
            streaming: StreamingConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    /// Default model for a provider, unless MATHTUTOR_MODEL is set
    pub fn default_for(provider: ProviderType) -> Self {
        let fallback = match provider {
            ProviderType::Ollama => "qwen3:8b",
            ProviderType::OpenAi => "gpt-3.5-turbo",
        };

        Self {
            name: env::var("MATHTUTOR_MODEL").unwrap_or_else(|_| fallback.to_string()),
            temperature: 0.0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::default_for(ProviderType::default())
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: env_flag("MATHTUTOR_STREAMING").unwrap_or(true),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python_command: env::var("MATHTUTOR_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            python_timeout_secs: 30,
            wikipedia_url: "https://en.wikipedia.org/w/api.php".to_string(),
            search_url: "https://api.duckduckgo.com/".to_string(),
            max_chars: 4000,
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| v == "true" || v == "1")
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mathtutor")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Credentials usually live in .env
        let _ = dotenvy::dotenv();

        Self::load_or_default(&Self::config_file())
    }

    /// Load `path` if it exists. A file that cannot be used is logged and
    /// replaced by defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring config file, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        Self::load_from_path(&Self::config_file())
    }

    /// Load configuration from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TutorError::config("Config file not found"));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| TutorError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| TutorError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the agent loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(TutorError::config("agent.max_iterations must be at least 1"));
        }
        if self.model.name.trim().is_empty() {
            return Err(TutorError::config("model.name must not be empty"));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| TutorError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TutorError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| TutorError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// URL of the active provider, for display
    pub fn provider_url(&self) -> String {
        match self.provider {
            ProviderType::Ollama => self.ollama_url(),
            ProviderType::OpenAi => self.openai.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
