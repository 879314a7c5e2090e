//! Custom error types for the tutor
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

use crate::agent::parser::OutputParseError;

/// Main error type for tutor operations
#[derive(Error, Debug)]
pub enum TutorError {
    /// Model provider connection or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider endpoint could not be reached
    #[error("Cannot reach {provider} at {url}. Is it running and configured?")]
    ProviderNotReachable { provider: String, url: String },

    /// Model not available on the provider
    #[error("Model '{0}' is not available on the configured provider")]
    ModelNotFound(String),

    /// The model asked for a tool that is not registered
    #[error("{name} is not a valid tool, try one of [{available}].")]
    UnknownTool { name: String, available: String },

    /// Model output did not follow the reasoning format
    #[error(transparent)]
    Parse(#[from] OutputParseError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for tutor operations
pub type Result<T> = std::result::Result<T, TutorError>;

impl TutorError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_message() {
        let err = TutorError::UnknownTool {
            name: "Abacus".to_string(),
            available: "Calculator, Python".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Abacus is not a valid tool, try one of [Calculator, Python]."
        );
    }

    #[test]
    fn test_with_context() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = TutorError::with_context("Failed to start python", io);
        assert_eq!(err.to_string(), "Failed to start python: missing");
    }
}
