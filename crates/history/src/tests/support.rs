//! Stub collaborators shared by the unit and scenario tests.

use crate::embeddings::EmbeddingProvider;
use crate::record::HistoryRecord;
use chrono::Utc;
use recall_core::{AppError, AppResult};
use recall_llm::{Citation, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn record_with_vector(query: &str, answer: &str, vector: Vec<f32>) -> HistoryRecord {
    HistoryRecord {
        query: query.to_string(),
        answer_text: Some(answer.to_string()),
        embedding: Some(vector),
        timestamp: Utc::now(),
        citations: Vec::new(),
        usage: None,
        raw_response: serde_json::Value::Null,
    }
}

/// Embedder returning canned vectors per text.
#[derive(Debug, Default)]
pub(crate) struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    delays: HashMap<String, Duration>,
    fallback: Option<Vec<f32>>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StubEmbedder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub(crate) fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// Vector for texts without a canned one; without it they fail.
    pub(crate) fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }

    pub(crate) fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-v1"
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delays.get(text) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail {
                return Err(AppError::Embedding("embedding service unavailable".to_string()));
            }

            let vector = self
                .vectors
                .get(text)
                .or(self.fallback.as_ref())
                .cloned()
                .ok_or_else(|| AppError::Embedding(format!("no vector for '{}'", text)))?;
            out.push(vector);
        }
        Ok(out)
    }
}

/// Chat client that records every request and answers "Answer to <query>".
#[derive(Default)]
pub(crate) struct StubChat {
    requests: Mutex<Vec<LlmRequest>>,
    failure: Option<String>,
    local_failure: Option<String>,
    citations: Vec<Citation>,
    embedding: Option<Vec<f32>>,
}

impl StubChat {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Fails before reaching the service, as a body that will not encode would.
    pub(crate) fn failing_locally(message: &str) -> Self {
        Self {
            local_failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn with_citations(mut self, urls: &[&str]) -> Self {
        self.citations = urls.iter().map(|u| Citation::new(*u)).collect();
        self
    }

    pub(crate) fn with_embedding(mut self, vector: Vec<f32>) -> Self {
        self.embedding = Some(vector);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for StubChat {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(ref message) = self.failure {
            return Err(AppError::Chat(message.clone()));
        }
        if let Some(ref message) = self.local_failure {
            return Err(AppError::Serialization(message.clone()));
        }

        let query = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(LlmResponse {
            content: format!("Answer to {}", query),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 20),
            citations: self.citations.clone(),
            embedding: self.embedding.clone(),
            raw: serde_json::json!({ "id": "stub" }),
        })
    }
}
