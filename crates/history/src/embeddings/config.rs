//! Embedding configuration.

use recall_core::AppConfig;
use serde::{Deserialize, Serialize};

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "openrouter", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Vector size for providers that need it up front (mock); hosted
    /// providers report their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    /// Custom endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider("mock")
    }
}

impl EmbeddingConfig {
    /// Defaults for a provider.
    pub fn for_provider(provider: &str) -> Self {
        let (model, dimensions) = match provider {
            "openrouter" => ("google/gemini-embedding-001", None),
            "ollama" => ("nomic-embed-text", None),
            _ => ("trigram-v1", Some(384)),
        };

        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            endpoint: None,
        }
    }

    /// Derive embedding settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let mut embedding = Self::for_provider(&config.embedding_provider);

        if let Some(ref model) = config.embedding_model {
            embedding.model = model.clone();
        }
        embedding.endpoint = config.provider_endpoint(&config.embedding_provider);

        embedding
    }
}
