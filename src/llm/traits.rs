//! LLM Provider trait for abstracting different backends
//!
//! The agent only needs plain text completion with stop sequences, so every
//! backend is reduced to that shape.

use async_trait::async_trait;

use crate::core::Result;

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Generated text, with any stop sequence already removed
    pub content: String,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

impl LLMResponse {
    /// Response without usage information
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
            model: model.into(),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Options for LLM generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Generation halts before any of these sequences
    pub stop: Option<Vec<String>>,
}

/// Callback invoked with each streamed token
pub type StreamCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete a raw prompt
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Complete a raw prompt, passing tokens to `on_token` as they arrive.
    ///
    /// Backends without streaming emit the whole completion as one token.
    async fn complete_stream(
        &self,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
        on_token: &(dyn for<'t> Fn(&'t str) + Send + Sync),
    ) -> Result<LLMResponse> {
        let response = self.complete(model, prompt, options).await?;
        on_token(&response.content);
        Ok(response)
    }

    /// Check if a model is available
    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m == model))
    }

    /// List available models
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Cut `text` at the first occurrence of any stop sequence.
///
/// Providers honour stop sequences server-side, but some stream a partial
/// marker before halting.
pub fn truncate_at_stop(text: &str, stop: Option<&[String]>) -> String {
    let Some(stop) = stop else {
        return text.to_string();
    };

    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
        .unwrap_or(text.len());

    text[..cut].to_string()
}

/// Remove the next complete line from a streamed byte buffer.
///
/// Bytes are decoded only once their line has fully arrived, so a
/// multibyte character split across network chunks stays intact.
pub fn next_line(buffer: &mut Vec<u8>) -> Option<String> {
    let newline_pos = buffer.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
    Some(String::from_utf8_lossy(&line).trim().to_string())
}
