//! OpenRouter chat provider.
//!
//! OpenRouter exposes an OpenAI-compatible `/chat/completions` endpoint in
//! front of many hosted models. Search-grounded models such as
//! `perplexity/sonar` attach their sources to the response, which is
//! normalized into [`Citation`](crate::Citation)s here.

use crate::citation::normalize_citations;
use crate::client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use recall_core::config::ProviderConfig;
use recall_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const SITE_URL_ENV: &str = "RECALL_SITE_URL";
const SITE_NAME_ENV: &str = "RECALL_SITE_NAME";

/// OpenRouter API request format.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenRouter chat client.
pub struct OpenRouterClient {
    base_url: String,
    api_key: String,
    site_url: Option<String>,
    site_name: Option<String>,
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a client for the public OpenRouter endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            site_url: None,
            site_name: None,
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attribution headers (`HTTP-Referer`, `X-Title`) used by OpenRouter rankings.
    pub fn with_site(mut self, site_url: Option<String>, site_name: Option<String>) -> Self {
        self.site_url = site_url;
        self.site_name = site_name;
        self
    }

    /// Apply the `openrouter` entry of the providers file.
    ///
    /// Attribution not set there falls back to `RECALL_SITE_URL` and
    /// `RECALL_SITE_NAME`.
    pub fn with_provider_config(self, config: Option<&ProviderConfig>) -> Self {
        let (endpoint, site_url, site_name) = match config {
            Some(ProviderConfig::OpenRouter {
                endpoint,
                site_url,
                site_name,
                ..
            }) => (endpoint.clone(), site_url.clone(), site_name.clone()),
            _ => (None, None, None),
        };

        let client = match endpoint {
            Some(endpoint) => self.with_base_url(endpoint),
            None => self,
        };
        let site_url = site_url.or_else(|| std::env::var(SITE_URL_ENV).ok());
        let site_name = site_name.or_else(|| std::env::var(SITE_NAME_ENV).ok());
        client.with_site(site_url, site_name)
    }

    fn to_openrouter_request(&self, request: &LlmRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Convert the raw payload into a normalized response.
    fn convert_response(&self, raw: serde_json::Value, fallback_model: &str) -> AppResult<LlmResponse> {
        let message = raw
            .pointer("/choices/0/message")
            .cloned()
            .ok_or_else(|| AppError::Chat("OpenRouter response has no choices".to_string()))?;

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        let model = raw
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(fallback_model)
            .to_string();

        let usage = raw
            .get("usage")
            .cloned()
            .and_then(|u| serde_json::from_value::<Usage>(u).ok())
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let citations = normalize_citations(&message, &raw);

        Ok(LlmResponse {
            content,
            model,
            usage,
            citations,
            embedding: None,
            raw,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenRouterClient {
    fn provider_name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(
            "Sending completion request to OpenRouter ({} turns)",
            request.messages.len()
        );
        tracing::debug!("Request: {:?}", request);

        let body = self.to_openrouter_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        if let Some(ref site_url) = self.site_url {
            builder = builder.header("HTTP-Referer", site_url);
        }
        if let Some(ref site_name) = self.site_name {
            builder = builder.header("X-Title", site_name);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Chat(format!("Failed to send request to OpenRouter: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Chat(format!(
                "OpenRouter API error ({}): {}",
                status, error_text
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Chat(format!("Failed to parse OpenRouter response: {}", e)))?;

        let converted = self.convert_response(raw, &request.model)?;

        tracing::info!(
            "Received completion from OpenRouter ({} citations)",
            converted.citations.len()
        );
        tracing::debug!("Usage: {:?}", converted.usage);

        Ok(converted)
    }
}
