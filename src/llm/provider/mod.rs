//! LLM Provider implementations and factory
//!
//! Ollama lives one level up as the primary backend; other providers live here.

pub mod openai;

use std::sync::Arc;

use crate::core::config::{Config, ProviderType};
use crate::llm::traits::LLMProvider;
use crate::llm::OllamaClient;

use self::openai::OpenAiProvider;

/// Create a new LLM provider based on configuration
pub fn create_provider(config: &Config) -> Arc<dyn LLMProvider> {
    match config.provider {
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)),
        ProviderType::OpenAi => Arc::new(OpenAiProvider::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_picks_configured_provider() {
        let mut config = Config::default();

        config.provider = ProviderType::Ollama;
        assert_eq!(create_provider(&config).name(), "ollama");

        config.provider = ProviderType::OpenAi;
        assert_eq!(create_provider(&config).name(), "openai");
    }
}
