//! Ollama client implementation
//!
//! Async HTTP client for the Ollama generate API with stop sequences and
//! streaming support.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

use crate::core::{Config, Result, TutorError};
use crate::llm::traits::{
    next_line, truncate_at_stop, GenerateOptions, LLMProvider, LLMResponse, TokenUsage,
};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Ollama generate response; also the shape of each streamed line
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    model: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::build(config.ollama_url(), config.ollama.timeout_secs)
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::build(base_url.into(), 120)
    }

    fn build(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    fn to_ollama_options(options: Option<&GenerateOptions>) -> Option<OllamaOptions> {
        options.map(|opts| OllamaOptions {
            temperature: opts.temperature,
            num_predict: opts.max_tokens,
            stop: opts.stop.clone(),
        })
    }

    fn usage(prompt: Option<u32>, completion: Option<u32>) -> Option<TokenUsage> {
        match (prompt, completion) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        }
    }

    /// Send a generate request and map transport and status errors
    async fn send_generate(&self, request: &GenerateRequest<'_>) -> Result<Response> {
        debug!(
            model = request.model,
            stream = request.stream,
            prompt_chars = request.prompt.len(),
            "ollama generate"
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(TutorError::ModelNotFound(request.model.to_string()));
            }

            return Err(TutorError::provider(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> TutorError {
        if e.is_connect() {
            TutorError::ProviderNotReachable {
                provider: "Ollama".to_string(),
                url: self.base_url.clone(),
            }
        } else {
            TutorError::from(e)
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = GenerateRequest {
            model,
            prompt,
            options: Self::to_ollama_options(options.as_ref()),
            stream: false,
        };

        let response = self.send_generate(&request).await?;
        let response_text = response.text().await?;
        trace!(body = %response_text, "ollama response");

        let generated: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| TutorError::provider(format!("Failed to parse response: {}", e)))?;

        let stop = options.as_ref().and_then(|o| o.stop.as_deref());
        Ok(LLMResponse {
            content: truncate_at_stop(&generated.response, stop),
            usage: Self::usage(generated.prompt_eval_count, generated.eval_count),
            model: generated.model,
        })
    }

    async fn complete_stream(
        &self,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
        on_token: &(dyn for<'t> Fn(&'t str) + Send + Sync),
    ) -> Result<LLMResponse> {
        let request = GenerateRequest {
            model,
            prompt,
            options: Self::to_ollama_options(options.as_ref()),
            stream: true,
        };

        let response = self.send_generate(&request).await?;

        let mut full_content = String::new();
        let mut final_model = model.to_string();
        let mut usage = None;

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        // Each complete line of the body is one JSON chunk
        let mut handle_line = |line: &str| {
            match serde_json::from_str::<GenerateResponse>(line) {
                Ok(chunk) => {
                    final_model = chunk.model;
                    if !chunk.response.is_empty() {
                        full_content.push_str(&chunk.response);
                        on_token(&chunk.response);
                    }
                    if chunk.done {
                        usage = Self::usage(chunk.prompt_eval_count, chunk.eval_count);
                    }
                }
                Err(e) => debug!(error = %e, line, "skipping unparseable stream line"),
            }
        };

        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| TutorError::provider(format!("Stream error: {}", e)))?;
            buffer.extend_from_slice(&chunk);

            while let Some(line) = next_line(&mut buffer) {
                if !line.is_empty() {
                    handle_line(&line);
                }
            }
        }

        let rest = String::from_utf8_lossy(&buffer);
        let rest = rest.trim();
        if !rest.is_empty() {
            handle_line(rest);
        }

        let stop = options.as_ref().and_then(|o| o.stop.as_deref());
        Ok(LLMResponse {
            content: truncate_at_stop(&full_content, stop),
            usage,
            model: final_model,
        })
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        // "qwen3" matches "qwen3:latest"
        Ok(models
            .iter()
            .any(|m| m == model || m.split(':').next() == model.split(':').next()))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(TutorError::provider("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::with_base_url("http://localhost:11434");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_serialization_includes_stop() {
        let options = GenerateOptions {
            temperature: Some(0.0),
            stop: Some(vec!["\nObservation:".to_string()]),
            ..Default::default()
        };
        let request = GenerateRequest {
            model: "qwen3:8b",
            prompt: "Question: 1+1",
            options: OllamaClient::to_ollama_options(Some(&options)),
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["stop"][0], "\nObservation:");
        assert_eq!(json["options"]["temperature"], 0.0);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_stream_line_parsing() {
        let line = r#"{"model":"qwen3:8b","response":"Thought","done":false}"#;
        let chunk: GenerateResponse = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.response, "Thought");
        assert!(!chunk.done);
    }
}
