//! Semantic search history.
//!
//! Keeps a bounded local log of answered queries with an embedding of each
//! answer, and uses it three ways: identical queries are answered from the
//! log, near-duplicate past exchanges are sent to the chat model as prior
//! turns, and partial input is matched against past queries as the user
//! types.

pub mod augment;
pub mod embeddings;
pub mod grouping;
pub mod kv;
pub mod metadata;
pub mod record;
pub mod session;
pub mod similarity;
pub mod store;
pub mod suggest;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use augment::{AugmentationDecider, Decision};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use grouping::{filter_entries, group_history, group_key, GroupKey, HistoryEntry, HistoryGroup};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use metadata::{MetadataCache, MetadataProvider, PageMetadata};
pub use record::HistoryRecord;
pub use session::{open_store, SearchOutcome, SearchSession};
pub use similarity::{rank, RankOptions, SimilarityMatch};
pub use store::HistoryStore;
pub use suggest::{Suggestion, SuggestionEngine, SuggestionOutcome};
pub use vector::cosine_similarity;
