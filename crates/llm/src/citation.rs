//! Citation normalization.
//!
//! Hosted search models report their sources in several shapes:
//! - OpenAI-style `message.annotations[]` entries, usually wrapping a
//!   `url_citation` object
//! - Perplexity-style `citations` arrays of bare URL strings, either on the
//!   message or at the top level of the payload
//! - Perplexity `search_results[]` objects with title and snippet
//!
//! Providers call [`normalize_citations`] once so everything downstream works
//! with a single [`Citation`] type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// A source referenced by a chat answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Citation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
        }
    }
}

/// Extract citations from a provider payload.
///
/// `message` is the assistant message object and `root` the full response.
/// The first non-empty shape wins, in the order annotations, message
/// citations, top-level citations, search results. Entries without a usable
/// URL are dropped and duplicate URLs keep their first occurrence.
pub fn normalize_citations(message: &Value, root: &Value) -> Vec<Citation> {
    let candidates = [
        from_entries(message.get("annotations")),
        from_entries(message.get("citations")),
        from_entries(root.get("citations")),
        from_entries(root.get("search_results")),
    ];

    let citations = candidates
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}

fn from_entries(entries: Option<&Value>) -> Vec<Citation> {
    entries
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(from_entry).collect())
        .unwrap_or_default()
}

fn from_entry(entry: &Value) -> Option<Citation> {
    if let Some(url) = entry.as_str() {
        return usable_url(url).map(Citation::new);
    }

    // Annotation entries nest the payload under `url_citation`
    let inner = entry.get("url_citation").unwrap_or(entry);

    let url = string_field(inner, "url").or_else(|| string_field(entry, "url"))?;
    let url = usable_url(&url)?;

    let title = string_field(inner, "title").or_else(|| string_field(entry, "title"));
    let snippet = ["content", "snippet", "text", "description"]
        .iter()
        .find_map(|key| string_field(inner, key).or_else(|| string_field(entry, key)));

    Some(Citation {
        url,
        title,
        snippet,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn usable_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() || url == "#" {
        None
    } else {
        Some(url.to_string())
    }
}
