//! Chat model integration for Recall.
//!
//! This crate provides a provider-agnostic abstraction over hosted chat
//! models. Requests are ordered conversation turns; responses are normalized
//! once here (text, usage, citations) so callers never sniff provider shapes.
//!
//! # Providers
//! - **OpenRouter**: OpenAI-compatible hosted models (default `perplexity/sonar`)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use recall_llm::{ChatMessage, LlmClient, LlmRequest, providers::OpenRouterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenRouterClient::new("sk-or-...");
//! let request = LlmRequest::new(vec![ChatMessage::user("capital of France")], "perplexity/sonar");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod citation;
pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use citation::{normalize_citations, Citation};
pub use client::{ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenRouterClient};
pub use types::ProviderType;
