//! OpenRouter embedding provider.
//!
//! Uses the OpenAI-compatible `/embeddings` endpoint with float encoding.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use recall_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// OpenRouter embeddings client.
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: api_key.to_string(),
            model: config.model.clone(),
        })
    }

    fn into_vectors(response: EmbeddingResponse, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        if response.data.len() != expected {
            return Err(AppError::Embedding(format!(
                "OpenRouter returned {} embeddings for {} inputs",
                response.data.len(),
                expected
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index.unwrap_or(0));
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenRouterProvider {
    fn provider_name(&self) -> &str {
        "openrouter"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        debug!("Requesting {} embeddings from {}", texts.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to OpenRouter: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "OpenRouter embeddings error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse embeddings response: {}", e)))?;

        if let Some(ref usage) = parsed.usage {
            debug!("Embedding usage: {}", usage);
        }

        Self::into_vectors(parsed, texts.len())
    }
}
