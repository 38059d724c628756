//! Citation link previews.
//!
//! Page metadata is fetched per citation URL, at most once per URL for the
//! life of the cache. Fetches are independent and unordered; a failed fetch
//! is logged and retried the next time the URL shows up.

use futures::stream::{self, StreamExt};
use recall_core::AppResult;
use recall_llm::Citation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const MAX_CONCURRENT_FETCHES: usize = 4;

/// Preview fields for a cited page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
}

/// Source of page metadata.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_metadata(&self, url: &str) -> AppResult<PageMetadata>;
}

/// URL-keyed metadata cache.
pub struct MetadataCache {
    provider: Arc<dyn MetadataProvider>,
    entries: RwLock<HashMap<String, PageMetadata>>,
}

impl MetadataCache {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, url: &str) -> Option<PageMetadata> {
        self.entries.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Cached metadata for `url`, fetching it on a miss.
    pub async fn fetch(&self, url: &str) -> Option<PageMetadata> {
        if let Some(cached) = self.get(url).await {
            return Some(cached);
        }

        match self.provider.fetch_metadata(url).await {
            Ok(metadata) => {
                self.entries
                    .write()
                    .await
                    .insert(url.to_string(), metadata.clone());
                Some(metadata)
            }
            Err(e) => {
                warn!("Metadata fetch failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch metadata for every citation not yet cached.
    pub async fn prefetch(&self, citations: &[Citation]) {
        let mut pending = Vec::new();
        {
            let entries = self.entries.read().await;
            for citation in citations {
                if !entries.contains_key(&citation.url) && !pending.contains(&citation.url) {
                    pending.push(citation.url.clone());
                }
            }
        }

        if pending.is_empty() {
            return;
        }
        debug!("Prefetching metadata for {} citations", pending.len());

        stream::iter(pending)
            .for_each_concurrent(MAX_CONCURRENT_FETCHES, |url| async move {
                self.fetch(&url).await;
            })
            .await;
    }

    /// Run `prefetch` in the background.
    pub fn spawn_prefetch(self: &Arc<Self>, citations: Vec<Citation>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move { cache.prefetch(&citations).await })
    }

    /// Title to show for a citation: page title, then citation title, then URL.
    pub async fn display_title(&self, citation: &Citation) -> String {
        self.get(&citation.url)
            .await
            .and_then(|m| m.title)
            .filter(|t| !t.is_empty())
            .or_else(|| citation.title.clone().filter(|t| !t.is_empty()))
            .unwrap_or_else(|| citation.url.clone())
    }
}
