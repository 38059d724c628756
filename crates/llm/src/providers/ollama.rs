//! Ollama chat provider.
//!
//! Talks to a local Ollama runtime through its `/api/chat` endpoint.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use recall_core::config::ProviderConfig;
use recall_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: ChatMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama chat client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Give up on requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build Ollama HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Apply the `ollama` entry of the providers file: endpoint and
    /// request timeout in seconds.
    pub fn with_provider_config(self, config: Option<&ProviderConfig>) -> AppResult<Self> {
        match config {
            Some(ProviderConfig::Ollama {
                endpoint, timeout, ..
            }) => {
                let client = Self {
                    base_url: endpoint.trim_end_matches('/').to_string(),
                    ..self
                };
                match timeout {
                    Some(secs) => client.with_timeout(Duration::from_secs(*secs)),
                    None => Ok(client),
                }
            }
            _ => Ok(self),
        }
    }

    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaChatRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaChatRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            stream: false,
            options,
        }
    }

    fn convert_response(&self, raw: serde_json::Value) -> AppResult<LlmResponse> {
        let response: OllamaChatResponse = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::Chat(format!("Failed to parse Ollama response: {}", e)))?;

        let usage = LlmUsage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        );

        Ok(LlmResponse {
            content: response.message.content,
            model: response.model,
            usage,
            citations: Vec::new(),
            embedding: None,
            raw,
        })
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending chat request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Chat(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Chat(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Chat(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::info!("Received completion from Ollama");

        self.convert_response(raw)
    }
}
