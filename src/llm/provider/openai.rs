//! OpenAI Provider
//!
//! Implementation for OpenAI and OpenAI-compatible chat completion APIs.
//! The whole prompt travels as a single user message.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

use crate::core::{Config, Result, TutorError};
use crate::llm::traits::{
    next_line, truncate_at_stop, GenerateOptions, LLMProvider, LLMResponse, TokenUsage,
};

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    delta: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

impl OpenAiProvider {
    pub fn from_config(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            api_key: resolve_api_key(config.openai.api_key.as_deref()),
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send_chat(&self, request: &ChatRequest<'_>) -> Result<Response> {
        debug!(model = request.model, stream = request.stream, "openai chat completion");

        let builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(request);

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("model") {
                return Err(TutorError::ModelNotFound(request.model.to_string()));
            }
            if status.as_u16() == 401 {
                return Err(TutorError::provider(
                    "OpenAI rejected the API key. Set OPENAI_API_KEY in the environment or .env",
                ));
            }

            return Err(TutorError::provider(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> TutorError {
        if e.is_connect() {
            TutorError::ProviderNotReachable {
                provider: "OpenAI".to_string(),
                url: self.base_url.clone(),
            }
        } else {
            TutorError::from(e)
        }
    }

    fn request<'a>(
        model: &'a str,
        prompt: &'a str,
        options: Option<&'a GenerateOptions>,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.and_then(|o| o.temperature),
            max_tokens: options.and_then(|o| o.max_tokens),
            stop: options.and_then(|o| o.stop.as_deref()),
            stream,
        }
    }
}

/// Configured key, else OPENAI_API_KEY from the environment
fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
}

/// Extract the JSON payload of one server-sent event line
fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = Self::request(model, prompt, options.as_ref(), false);
        let response = self.send_chat(&request).await?;

        let response_text = response.text().await?;
        trace!(body = %response_text, "openai response");

        let chat: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| TutorError::provider(format!("Failed to parse response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        let stop = options.as_ref().and_then(|o| o.stop.as_deref());
        Ok(LLMResponse {
            content: truncate_at_stop(&content, stop),
            usage: chat
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: chat.model,
        })
    }

    async fn complete_stream(
        &self,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
        on_token: &(dyn for<'t> Fn(&'t str) + Send + Sync),
    ) -> Result<LLMResponse> {
        let request = Self::request(model, prompt, options.as_ref(), true);
        let response = self.send_chat(&request).await?;

        let mut full_content = String::new();
        let mut final_model = model.to_string();
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut finished = false;

        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| TutorError::provider(format!("Stream error: {}", e)))?;
            buffer.extend_from_slice(&chunk);

            while let Some(line) = next_line(&mut buffer) {
                let Some(data) = sse_data(&line) else {
                    continue;
                };
                if data == "[DONE]" {
                    finished = true;
                    break;
                }

                match serde_json::from_str::<StreamChunk>(data) {
                    Ok(chunk) => {
                        if let Some(m) = chunk.model {
                            final_model = m;
                        }
                        let token = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta)
                            .and_then(|d| d.content)
                            .unwrap_or_default();
                        if !token.is_empty() {
                            full_content.push_str(&token);
                            on_token(&token);
                        }
                    }
                    Err(e) => debug!(error = %e, line = %line, "skipping unparseable event"),
                }
            }

            if finished {
                break;
            }
        }

        let stop = options.as_ref().and_then(|o| o.stop.as_deref());
        Ok(LLMResponse {
            content: truncate_at_stop(&full_content, stop),
            usage: None,
            model: final_model,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let builder = self.client.get(format!("{}/v1/models", self.base_url));
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(TutorError::provider("Failed to list models"));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
