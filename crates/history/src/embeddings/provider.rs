//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use recall_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Vector size is opaque to the pipeline; it only has to stay consistent for
/// one provider configuration.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openrouter", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Embedding dimensions, when known ahead of the first request
    fn dimensions(&self) -> Option<usize>;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "mock" => {
            let dimensions = config.dimensions.unwrap_or(384);
            let provider = super::providers::mock::MockProvider::new(dimensions);
            Ok(Arc::new(provider))
        }

        "openrouter" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenRouter embeddings require an API key".to_string())
            })?;
            let provider = super::providers::openrouter::OpenRouterProvider::new(config, api_key)?;
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let provider = super::providers::ollama::OllamaProvider::new(config)?;
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openrouter, ollama, mock",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let config = EmbeddingConfig {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: Some(64),
            endpoint: None,
        };

        let provider = create_provider(&config, None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), Some(64));
    }

    #[test]
    fn test_openrouter_requires_key() {
        let config = EmbeddingConfig::for_provider("openrouter");
        let result = create_provider(&config, None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_create_openrouter_provider() {
        let config = EmbeddingConfig::for_provider("openrouter");
        let provider = create_provider(&config, Some("sk-or-test")).unwrap();
        assert_eq!(provider.provider_name(), "openrouter");
        assert_eq!(provider.model_name(), "google/gemini-embedding-001");
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = EmbeddingConfig::for_provider("unknown");
        let result = create_provider(&config, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&EmbeddingConfig::default(), None).unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
