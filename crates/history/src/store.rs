//! Append-only, capacity-bounded search history.
//!
//! Storage order is oldest-first. Display order (what `all` returns and what
//! display indices refer to) is newest-first.

use crate::kv::KeyValueStore;
use crate::record::HistoryRecord;
use recall_core::{AppError, AppResult};
use std::sync::Arc;

/// Key the history log is stored under.
pub const HISTORY_KEY: &str = "searchHistory";

/// Default number of records kept.
pub const DEFAULT_CAPACITY: usize = 100;

/// History log over a key-value store.
///
/// Every operation is a read-modify-write of the whole log. Two writers on
/// the same store race and the last write wins.
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(kv, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(kv: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            kv,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored log, oldest first.
    ///
    /// A missing key or corrupt JSON reads as empty. A failed read is an
    /// error, so writers never overwrite a log they could not see.
    fn load(&self) -> AppResult<Vec<HistoryRecord>> {
        let raw = match self.kv.get_item(HISTORY_KEY)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("Stored history is corrupt, treating as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// `load` for read-only views; a failed read shows no history.
    fn load_or_empty(&self) -> Vec<HistoryRecord> {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("Failed to read history: {}", e);
            Vec::new()
        })
    }

    fn save(&self, records: &[HistoryRecord]) -> AppResult<()> {
        let json = serde_json::to_string(records)?;
        self.kv.set_item(HISTORY_KEY, &json)
    }

    /// Append a record, evicting the oldest entries beyond capacity.
    pub fn append(&self, record: HistoryRecord) -> AppResult<()> {
        let mut records = self.load()?;
        records.push(record);

        if records.len() > self.capacity {
            let overflow = records.len() - self.capacity;
            records.drain(..overflow);
            tracing::debug!("Evicted {} oldest history records", overflow);
        }

        self.save(&records)
    }

    /// All records, newest first.
    pub fn all(&self) -> Vec<HistoryRecord> {
        let mut records = self.load_or_empty();
        records.reverse();
        records
    }

    pub fn len(&self) -> usize {
        self.load_or_empty().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the record at a newest-first display index.
    pub fn delete_at(&self, display_index: usize) -> AppResult<HistoryRecord> {
        let mut records = self.load()?;

        if display_index >= records.len() {
            return Err(AppError::Validation(format!(
                "No history entry at index {} ({} entries)",
                display_index,
                records.len()
            )));
        }

        let storage_index = records.len() - 1 - display_index;
        let removed = records.remove(storage_index);
        self.save(&records)?;

        tracing::debug!("Deleted history entry '{}'", removed.query);
        Ok(removed)
    }

    /// Remove every record.
    pub fn clear(&self) -> AppResult<()> {
        self.kv.remove_item(HISTORY_KEY)
    }

    /// Most recent record whose query equals `query_text` exactly.
    ///
    /// Case-sensitive; callers trim before looking up.
    pub fn find_exact(&self, query_text: &str) -> Option<HistoryRecord> {
        self.load_or_empty()
            .into_iter()
            .rev()
            .find(|record| record.query == query_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn record(query: &str, answer: &str, minutes: i64) -> HistoryRecord {
        HistoryRecord {
            query: query.to_string(),
            answer_text: Some(answer.to_string()),
            embedding: None,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
            citations: Vec::new(),
            usage: None,
            raw_response: serde_json::Value::Null,
        }
    }

    fn store() -> (HistoryStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        (HistoryStore::new(kv.clone()), kv)
    }

    #[test]
    fn test_all_is_newest_first() {
        let (store, _) = store();
        store.append(record("first", "1", 0)).unwrap();
        store.append(record("second", "2", 1)).unwrap();
        store.append(record("third", "3", 2)).unwrap();

        let queries: Vec<_> = store.all().into_iter().map(|r| r.query).collect();
        assert_eq!(queries, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_storage_order_is_oldest_first() {
        let (store, kv) = store();
        store.append(record("first", "1", 0)).unwrap();
        store.append(record("second", "2", 1)).unwrap();

        let raw = kv.get_item(HISTORY_KEY).unwrap().unwrap();
        let stored: Vec<HistoryRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored[0].query, "first");
        assert_eq!(stored[1].query, "second");
    }

    #[test]
    fn test_capacity_evicts_exactly_the_oldest() {
        let (store, _) = store();
        for i in 0..100 {
            store.append(record(&format!("q{}", i), "a", i)).unwrap();
        }
        assert_eq!(store.len(), 100);

        store.append(record("q100", "a", 100)).unwrap();

        let all = store.all();
        assert_eq!(all.len(), 100);
        assert_eq!(all[0].query, "q100");
        assert_eq!(all[99].query, "q1");
        assert!(all.iter().all(|r| r.query != "q0"));
    }

    #[test]
    fn test_custom_capacity() {
        let kv = Arc::new(MemoryStore::new());
        let store = HistoryStore::with_capacity(kv, 2);
        store.append(record("a", "1", 0)).unwrap();
        store.append(record("b", "2", 1)).unwrap();
        store.append(record("c", "3", 2)).unwrap();

        let queries: Vec<_> = store.all().into_iter().map(|r| r.query).collect();
        assert_eq!(queries, vec!["c", "b"]);
    }

    #[test]
    fn test_delete_at_zero_removes_newest() {
        let (store, _) = store();
        store.append(record("old", "1", 0)).unwrap();
        store.append(record("new", "2", 1)).unwrap();

        let removed = store.delete_at(0).unwrap();

        assert_eq!(removed.query, "new");
        let remaining: Vec<_> = store.all().into_iter().map(|r| r.query).collect();
        assert_eq!(remaining, vec!["old"]);
    }

    #[test]
    fn test_delete_at_maps_display_to_storage_index() {
        let (store, _) = store();
        for (i, q) in ["a", "b", "c", "d"].iter().enumerate() {
            store.append(record(q, "x", i as i64)).unwrap();
        }

        // Display order: d, c, b, a
        let removed = store.delete_at(2).unwrap();

        assert_eq!(removed.query, "b");
        let remaining: Vec<_> = store.all().into_iter().map(|r| r.query).collect();
        assert_eq!(remaining, vec!["d", "c", "a"]);
    }

    #[test]
    fn test_delete_at_out_of_range() {
        let (store, _) = store();
        store.append(record("only", "1", 0)).unwrap();

        assert!(matches!(store.delete_at(1), Err(AppError::Validation(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_queries_are_distinct_records() {
        let (store, _) = store();
        store.append(record("same", "old answer", 0)).unwrap();
        store.append(record("same", "new answer", 1)).unwrap();

        assert_eq!(store.len(), 2);
        let found = store.find_exact("same").unwrap();
        assert_eq!(found.answer(), "new answer");
    }

    #[test]
    fn test_find_exact_is_case_sensitive() {
        let (store, _) = store();
        store.append(record("Capital of France", "Paris", 0)).unwrap();

        assert!(store.find_exact("capital of france").is_none());
        assert!(store.find_exact("Capital of France").is_some());
    }

    #[test]
    fn test_clear() {
        let (store, kv) = store();
        store.append(record("a", "1", 0)).unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        assert_eq!(kv.get_item(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_store_reads_empty_and_recovers() {
        let (store, kv) = store();
        kv.set_item(HISTORY_KEY, "{not json").unwrap();

        assert!(store.all().is_empty());
        assert!(store.find_exact("anything").is_none());

        store.append(record("fresh", "1", 0)).unwrap();
        assert_eq!(store.len(), 1);
    }

    /// Memory store whose next `get_item` fails once.
    struct FlakyReadStore {
        inner: MemoryStore,
        fail_next_read: std::sync::atomic::AtomicBool,
    }

    impl FlakyReadStore {
        fn fail_next_read(&self) {
            self.fail_next_read
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl KeyValueStore for FlakyReadStore {
        fn get_item(&self, key: &str) -> AppResult<Option<String>> {
            if self
                .fail_next_read
                .swap(false, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(AppError::Storage("database is locked".to_string()));
            }
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> AppResult<()> {
            self.inner.remove_item(key)
        }
    }

    fn flaky_store() -> (HistoryStore, Arc<FlakyReadStore>) {
        let kv = Arc::new(FlakyReadStore {
            inner: MemoryStore::new(),
            fail_next_read: std::sync::atomic::AtomicBool::new(false),
        });
        (HistoryStore::new(kv.clone()), kv)
    }

    #[test]
    fn test_append_after_failed_read_keeps_existing_log() {
        let (store, kv) = flaky_store();
        for i in 0..50 {
            store.append(record(&format!("q{}", i), "a", i)).unwrap();
        }

        kv.fail_next_read();
        let result = store.append(record("new", "a", 60));

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(store.len(), 50);
        assert!(store.find_exact("new").is_none());
    }

    #[test]
    fn test_delete_after_failed_read_keeps_existing_log() {
        let (store, kv) = flaky_store();
        store.append(record("first", "1", 0)).unwrap();
        store.append(record("second", "2", 1)).unwrap();

        kv.fail_next_read();
        assert!(matches!(store.delete_at(0), Err(AppError::Storage(_))));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_failed_read_shows_empty_view() {
        let (store, kv) = flaky_store();
        store.append(record("first", "1", 0)).unwrap();

        kv.fail_next_read();
        assert!(store.all().is_empty());
        // The log itself is untouched.
        assert_eq!(store.len(), 1);
    }
}
