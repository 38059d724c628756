//! As-you-type suggestions from past queries.
//!
//! Each input change takes a generation token. The request waits out the
//! debounce window and drops itself if a newer keystroke arrived meanwhile;
//! the same check runs again once the embedding comes back, so a slow
//! embedding for stale input never reaches the caller.

use crate::embeddings::EmbeddingProvider;
use crate::similarity::{rank, RankOptions};
use crate::store::HistoryStore;
use recall_core::HistoryPolicy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A past query related to the current input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub query: String,
    pub similarity_score: f32,
}

/// Result of one input change.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionOutcome {
    /// Suggestions for the latest input; empty hides the panel
    Ready(Vec<Suggestion>),
    /// A newer input arrived; ignore this result
    Superseded,
}

impl SuggestionOutcome {
    pub fn into_suggestions(self) -> Vec<Suggestion> {
        match self {
            SuggestionOutcome::Ready(suggestions) => suggestions,
            SuggestionOutcome::Superseded => Vec::new(),
        }
    }
}

pub struct SuggestionEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: HistoryStore,
    debounce: Duration,
    options: RankOptions,
    generation: AtomicU64,
}

impl SuggestionEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: HistoryStore,
        debounce: Duration,
        options: RankOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            debounce,
            options,
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_policy(
        embedder: Arc<dyn EmbeddingProvider>,
        store: HistoryStore,
        policy: &HistoryPolicy,
    ) -> Self {
        Self::new(
            embedder,
            store,
            Duration::from_millis(policy.debounce_ms),
            RankOptions::new(policy.suggestion_threshold, policy.suggestion_limit),
        )
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Abandon any pending request.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Handle an input change.
    pub async fn on_input(&self, partial: &str) -> SuggestionOutcome {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let text = partial.trim();
        if text.is_empty() {
            return SuggestionOutcome::Ready(Vec::new());
        }

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(token) {
            debug!("Suggestion request for '{}' superseded during debounce", text);
            return SuggestionOutcome::Superseded;
        }

        let embedding = self.embedder.embed(text).await;
        if !self.is_current(token) {
            debug!("Discarding stale suggestion result for '{}'", text);
            return SuggestionOutcome::Superseded;
        }

        let vector = match embedding {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Suggestion embedding failed: {}", e);
                return SuggestionOutcome::Ready(Vec::new());
            }
        };

        let suggestions = self.suggest_for_vector(&vector);
        debug!("{} suggestions for '{}'", suggestions.len(), text);
        SuggestionOutcome::Ready(suggestions)
    }

    /// Rank all history against an already-computed query vector.
    pub fn suggest_for_vector(&self, vector: &[f32]) -> Vec<Suggestion> {
        rank(vector, &self.store.all(), self.options)
            .into_iter()
            .map(|m| Suggestion {
                query: m.record.query,
                similarity_score: m.score,
            })
            .collect()
    }
}
