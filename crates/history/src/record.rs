//! History record type.

use chrono::{DateTime, Utc};
use recall_llm::{Citation, LlmResponse, LlmUsage};
use serde::{Deserialize, Serialize};

/// One persisted search.
///
/// Records are created only after a successful chat response and are never
/// edited afterwards; the store is rewritten wholesale instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Query text as submitted (trimmed); the exact-match key
    pub query: String,

    /// Model answer
    #[serde(default)]
    pub answer_text: Option<String>,

    /// Semantic vector of the answer; absent when embedding failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Creation instant
    pub timestamp: DateTime<Utc>,

    /// Sources cited by the answer
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Token usage reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,

    /// Provider payload, kept for display and debugging
    #[serde(default)]
    pub raw_response: serde_json::Value,
}

impl HistoryRecord {
    /// Build a record from a chat response.
    pub fn from_response(
        query: impl Into<String>,
        response: LlmResponse,
        embedding: Option<Vec<f32>>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            query: query.into(),
            answer_text: Some(response.content),
            embedding,
            timestamp,
            citations: response.citations,
            usage: Some(response.usage),
            raw_response: response.raw,
        }
    }

    /// The embedding, if present and non-empty.
    pub fn vector(&self) -> Option<&[f32]> {
        self.embedding.as_deref().filter(|v| !v.is_empty())
    }

    /// Answer text, or an empty string.
    pub fn answer(&self) -> &str {
        self.answer_text.as_deref().unwrap_or_default()
    }
}
