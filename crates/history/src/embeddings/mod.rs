//! Embedding generation.
//!
//! Provider-agnostic text embeddings used to compare queries with past answers.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
