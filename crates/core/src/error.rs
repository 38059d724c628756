//! Error types for Recall.
//!
//! One enum covers every failure category. Only a few of them ever reach the
//! user: `Validation` (rejected before any upstream call) and `Chat` (the chat
//! provider failed). Embedding, metadata and storage failures are absorbed by
//! the search pipeline and only logged.

use thiserror::Error;

/// Unified error type for Recall.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before any upstream call (empty query, bad index)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Chat provider failure, carrying the provider-supplied detail
    #[error("Chat error: {0}")]
    Chat(String),

    /// Embedding provider failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Citation metadata fetch failure
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Persistent key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from an external service (chat, embedding,
    /// metadata) rather than from local input or state.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Chat(_) | AppError::Embedding(_) | AppError::Metadata(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
