//! Query-time history policy.
//!
//! Decides whether a submitted query is answered from history or sent to the
//! chat model, and which past exchanges go along as conversation context.

use crate::embeddings::EmbeddingProvider;
use crate::record::HistoryRecord;
use crate::similarity::{rank, RankOptions, SimilarityMatch};
use crate::store::HistoryStore;
use recall_core::HistoryPolicy;
use recall_llm::ChatMessage;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Identical query already answered; serve the stored record
    Reuse(HistoryRecord),
    /// Ask the chat model, with these near-duplicates as prior turns
    Ask { context: Vec<SimilarityMatch> },
}

pub struct AugmentationDecider {
    store: HistoryStore,
    embedder: Arc<dyn EmbeddingProvider>,
    options: RankOptions,
}

impl AugmentationDecider {
    pub fn new(store: HistoryStore, embedder: Arc<dyn EmbeddingProvider>, options: RankOptions) -> Self {
        Self {
            store,
            embedder,
            options,
        }
    }

    pub fn from_policy(
        store: HistoryStore,
        embedder: Arc<dyn EmbeddingProvider>,
        policy: &HistoryPolicy,
    ) -> Self {
        Self::new(
            store,
            embedder,
            RankOptions::new(policy.near_duplicate_threshold, policy.near_duplicate_limit),
        )
    }

    /// Decide how to answer `query`, which the caller has already trimmed.
    ///
    /// The exact-match lookup runs before any embedding call. An embedding
    /// failure means no context, not an error.
    pub async fn decide(&self, query: &str) -> Decision {
        if let Some(record) = self.store.find_exact(query) {
            debug!("Exact history match for '{}'", query);
            return Decision::Reuse(record);
        }

        let vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Query embedding failed, continuing without history: {}", e);
                return Decision::Ask {
                    context: Vec::new(),
                };
            }
        };

        let context = rank(&vector, &self.store.all(), self.options);
        debug!("{} near-duplicate history entries for '{}'", context.len(), query);

        Decision::Ask { context }
    }

    /// Conversation turns for a chat call: each match as a user/assistant
    /// pair, oldest match first, then the new query.
    ///
    /// A match with no answer text contributes only its user turn.
    pub fn build_turns(context: &[SimilarityMatch], query: &str) -> Vec<ChatMessage> {
        let mut ordered: Vec<&SimilarityMatch> = context.iter().collect();
        ordered.sort_by_key(|m| m.record.timestamp);

        let mut turns = Vec::with_capacity(ordered.len() * 2 + 1);
        for m in ordered {
            turns.push(ChatMessage::user(m.record.query.clone()));
            let answer = m.record.answer();
            if !answer.is_empty() {
                turns.push(ChatMessage::assistant(answer));
            }
        }
        turns.push(ChatMessage::user(query));
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::tests::support::{record_with_vector, StubEmbedder};
    use chrono::{Duration, Utc};
    use recall_llm::ChatRole;
    use std::sync::atomic::Ordering;

    fn decider(embedder: StubEmbedder) -> (AugmentationDecider, HistoryStore) {
        let store = HistoryStore::new(Arc::new(MemoryStore::new()));
        let decider = AugmentationDecider::new(
            store.clone(),
            Arc::new(embedder),
            RankOptions::new(0.9, 3),
        );
        (decider, store)
    }

    #[tokio::test]
    async fn test_exact_match_skips_embedding() {
        let embedder = StubEmbedder::new();
        let calls = embedder.call_counter();
        let (decider, store) = decider(embedder);
        store
            .append(record_with_vector("capital of France", "Paris", vec![1.0, 0.0]))
            .unwrap();

        match decider.decide("capital of France").await {
            Decision::Reuse(record) => assert_eq!(record.answer(), "Paris"),
            other => panic!("expected reuse, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_near_duplicates_become_context() {
        let embedder = StubEmbedder::new().with_vector("France's capital?", vec![0.95, 0.312]);
        let (decider, store) = decider(embedder);
        store
            .append(record_with_vector("capital of France", "Paris", vec![1.0, 0.0]))
            .unwrap();
        store
            .append(record_with_vector("banana bread", "Bake it", vec![0.0, 1.0]))
            .unwrap();

        match decider.decide("France's capital?").await {
            Decision::Ask { context } => {
                assert_eq!(context.len(), 1);
                assert_eq!(context[0].record.query, "capital of France");
            }
            other => panic!("expected ask, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_context_is_limited_to_three_matches() {
        let embedder = StubEmbedder::new().with_vector("France again", vec![1.0, 0.0]);
        let (decider, store) = decider(embedder);
        for i in 0..5 {
            store
                .append(record_with_vector(&format!("France {}", i), "Paris", vec![1.0, 0.0]))
                .unwrap();
        }

        let context = match decider.decide("France again").await {
            Decision::Ask { context } => context,
            other => panic!("expected ask, got {:?}", other),
        };
        assert_eq!(context.len(), 3);

        let turns = AugmentationDecider::build_turns(&context, "France again");
        assert_eq!(turns.len(), 7);
        assert_eq!(turns[6].content, "France again");
    }

    #[tokio::test]
    async fn test_embedding_failure_means_no_context() {
        let (decider, store) = decider(StubEmbedder::failing());
        store
            .append(record_with_vector("capital of France", "Paris", vec![1.0, 0.0]))
            .unwrap();

        assert_eq!(
            decider.decide("France?").await,
            Decision::Ask {
                context: Vec::new()
            }
        );
    }

    #[test]
    fn test_turns_are_oldest_match_first() {
        let now = Utc::now();
        let mut older = record_with_vector("old question", "old answer", vec![1.0]);
        older.timestamp = now - Duration::days(2);
        let newer = record_with_vector("new question", "new answer", vec![1.0]);

        // Ranked order puts the newer, better match first.
        let context = vec![
            SimilarityMatch {
                record: newer,
                score: 0.99,
            },
            SimilarityMatch {
                record: older,
                score: 0.95,
            },
        ];

        let turns = AugmentationDecider::build_turns(&context, "follow-up");
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["old question", "old answer", "new question", "new answer", "follow-up"]
        );
        assert_eq!(turns.last().map(|t| t.role), Some(ChatRole::User));
    }

    #[test]
    fn test_missing_answer_skips_assistant_turn() {
        let mut record = record_with_vector("q", "", vec![1.0]);
        record.answer_text = None;
        let context = vec![SimilarityMatch { record, score: 0.95 }];

        let turns = AugmentationDecider::build_turns(&context, "next");
        assert_eq!(turns, vec![ChatMessage::user("q"), ChatMessage::user("next")]);
    }

    #[test]
    fn test_no_context_is_single_turn() {
        let turns = AugmentationDecider::build_turns(&[], "hello");
        assert_eq!(turns, vec![ChatMessage::user("hello")]);
    }
}
