//! Embedding provider implementations.

pub mod mock;
pub mod ollama;
pub mod openrouter;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;
