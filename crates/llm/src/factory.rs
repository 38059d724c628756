//! Chat provider factory.
//!
//! Builds an `LlmClient` from a provider name plus the provider entry and
//! secret resolved by the application configuration.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenRouterClient};
use crate::types::ProviderType;
use recall_core::config::ProviderConfig;
use std::sync::Arc;

/// Create a chat client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openrouter", "ollama")
/// * `provider_config` - The provider's entry from the providers file, if any
/// * `api_key` - API key, required by OpenRouter
///
/// # Errors
/// Returns error if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    provider_config: Option<&ProviderConfig>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    match ProviderType::parse(provider) {
        Some(ProviderType::OpenRouter) => {
            let api_key = api_key.ok_or_else(|| "OpenRouter provider requires API key".to_string())?;
            let client = OpenRouterClient::new(api_key).with_provider_config(provider_config);
            Ok(Arc::new(client))
        }
        Some(ProviderType::Ollama) => {
            let client = OllamaClient::new()
                .with_provider_config(provider_config)
                .map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
        None => Err(format!("Unknown provider: {}", provider)),
    }
}
