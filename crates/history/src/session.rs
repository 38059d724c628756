//! Search session: the history-aware entry point used by front ends.

use crate::augment::{AugmentationDecider, Decision};
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::grouping::{filter_entries, group_history, HistoryGroup};
use crate::kv::SqliteStore;
use crate::metadata::MetadataCache;
use crate::record::HistoryRecord;
use crate::store::HistoryStore;
use crate::suggest::{Suggestion, SuggestionEngine};
use chrono::{DateTime, Local, TimeZone, Utc};
use recall_core::{AppConfig, AppError, AppResult, HistoryPolicy};
use recall_llm::{create_client, Citation, LlmClient, LlmRequest, LlmUsage};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer to a submitted query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub answer_text: String,
    pub citations: Vec<Citation>,
    /// Served from an identical past query without a chat call
    pub from_history: bool,
    /// Past queries sent along as conversation context
    pub context_queries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

/// Open the SQLite-backed history store configured for the workspace.
pub fn open_store(config: &AppConfig) -> AppResult<HistoryStore> {
    let path = config.history_db_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Storage(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    debug!("Opening history store at {:?}", path);
    let kv = SqliteStore::open(&path)?;
    Ok(HistoryStore::with_capacity(Arc::new(kv), config.history.capacity))
}

pub struct SearchSession {
    store: HistoryStore,
    decider: AugmentationDecider,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn LlmClient>,
    model: String,
    suggestions: SuggestionEngine,
    metadata: Option<Arc<MetadataCache>>,
}

impl SearchSession {
    pub fn new(
        store: HistoryStore,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn LlmClient>,
        model: impl Into<String>,
        policy: &HistoryPolicy,
    ) -> Self {
        Self {
            decider: AugmentationDecider::from_policy(store.clone(), embedder.clone(), policy),
            suggestions: SuggestionEngine::from_policy(embedder.clone(), store.clone(), policy),
            store,
            embedder,
            chat,
            model: model.into(),
            metadata: None,
        }
    }

    /// Build a session from configuration: SQLite history, configured
    /// embedding provider and chat client.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let store = open_store(config)?;

        let embedding_config = EmbeddingConfig::from_app_config(config);
        let embedding_key = config.resolve_api_key(&config.embedding_provider);
        let embedder = create_provider(&embedding_config, embedding_key.as_deref())?;

        let chat_config = config.get_provider_config(&config.provider);
        let chat_key = config.resolve_api_key(&config.provider);
        let chat = create_client(&config.provider, chat_config.as_ref(), chat_key.as_deref())
            .map_err(AppError::Config)?;

        info!(
            "Session ready: chat {}/{}, embeddings {}/{}",
            chat.provider_name(),
            config.model,
            embedder.provider_name(),
            embedder.model_name()
        );

        Ok(Self::new(store, embedder, chat, config.model.clone(), &config.history))
    }

    /// Attach a citation metadata cache; citations of every answer are then
    /// prefetched in the background.
    pub fn with_metadata(mut self, cache: Arc<MetadataCache>) -> Self {
        self.metadata = Some(cache);
        self
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    /// Answer a query, from history when an identical query exists and from
    /// the chat model otherwise.
    ///
    /// Only a chat failure is an error. Embedding and storage failures are
    /// logged and the answer is still returned.
    pub async fn search(&self, query: &str) -> AppResult<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Query must not be empty".to_string()));
        }

        let context = match self.decider.decide(query).await {
            Decision::Reuse(record) => {
                info!("Answering '{}' from history", query);
                self.prefetch_metadata(&record.citations);
                return Ok(SearchOutcome {
                    answer_text: record.answer().to_string(),
                    citations: record.citations,
                    from_history: true,
                    context_queries: Vec::new(),
                    usage: None,
                });
            }
            Decision::Ask { context } => context,
        };

        let turns = AugmentationDecider::build_turns(&context, query);
        let request = LlmRequest::new(turns, self.model.clone());
        debug!(
            "Sending {} turns to {} ({} from history)",
            request.messages.len(),
            self.chat.provider_name(),
            context.len()
        );

        // Local failures inside the client still surface as a chat failure
        let response = self.chat.complete(&request).await.map_err(|e| {
            if e.is_upstream() {
                e
            } else {
                AppError::Chat(format!("{} request failed: {}", self.chat.provider_name(), e))
            }
        })?;

        let embedding = match response.embedding.clone().filter(|v| !v.is_empty()) {
            Some(vector) => Some(vector),
            None => self.embed_answer(&response.content).await,
        };

        let outcome = SearchOutcome {
            answer_text: response.content.clone(),
            citations: response.citations.clone(),
            from_history: false,
            context_queries: context.iter().map(|m| m.record.query.clone()).collect(),
            usage: Some(response.usage.clone()),
        };

        let record = HistoryRecord::from_response(query, response, embedding, Utc::now());
        if let Err(e) = self.store.append(record) {
            warn!("Failed to save '{}' to history: {}", query, e);
        }

        self.prefetch_metadata(&outcome.citations);
        Ok(outcome)
    }

    async fn embed_answer(&self, answer: &str) -> Option<Vec<f32>> {
        if answer.trim().is_empty() {
            return None;
        }

        match self.embedder.embed(answer).await {
            Ok(vector) if !vector.is_empty() => Some(vector),
            Ok(_) => None,
            Err(e) => {
                warn!("Answer embedding failed, storing without one: {}", e);
                None
            }
        }
    }

    fn prefetch_metadata(&self, citations: &[Citation]) {
        if let Some(ref cache) = self.metadata {
            if !citations.is_empty() {
                cache.spawn_prefetch(citations.to_vec());
            }
        }
    }

    /// Debounced suggestions for partial input. A superseded request yields
    /// no suggestions.
    pub async fn live_suggest(&self, partial: &str) -> Vec<Suggestion> {
        self.suggestions.on_input(partial).await.into_suggestions()
    }

    /// Run a full search for a picked suggestion, using its stored query
    /// text verbatim.
    pub async fn select_suggestion(&self, suggestion: &Suggestion) -> AppResult<SearchOutcome> {
        self.suggestions.cancel();
        self.search(&suggestion.query).await
    }

    /// History grouped by relative date in the local time zone, optionally
    /// filtered by a case-insensitive query substring.
    pub fn list_history(&self, filter: Option<&str>) -> Vec<HistoryGroup> {
        self.list_history_at(filter, &Local::now())
    }

    pub fn list_history_at<Tz: TimeZone>(
        &self,
        filter: Option<&str>,
        now: &DateTime<Tz>,
    ) -> Vec<HistoryGroup> {
        group_history(filter_entries(self.store.all(), filter), now)
    }

    /// Delete the entry at a newest-first display index.
    pub fn delete_history_entry(&self, display_index: usize) -> AppResult<HistoryRecord> {
        let removed = self.store.delete_at(display_index)?;
        info!("Deleted history entry '{}'", removed.query);
        Ok(removed)
    }

    pub fn clear_history(&self) -> AppResult<()> {
        self.suggestions.cancel();
        self.store.clear()?;
        info!("Cleared search history");
        Ok(())
    }
}
