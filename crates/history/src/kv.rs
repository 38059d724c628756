//! Persistent key-value stores.
//!
//! The history log lives under a single key as a JSON string. Backends are
//! synchronous and scoped to one client; there is no locking across processes.

use recall_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key is absent.
    fn get_item(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> AppResult<()>;

    /// Delete a key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> AppResult<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| AppError::Storage("Memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// SQLite-backed store holding a single `kv` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open SQLite store: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite store at {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("SQLite store lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        self.lock()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| AppError::Storage(format!("Failed to read key '{}': {}", key, e)))
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock()?
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| AppError::Storage(format!("Failed to write key '{}': {}", key, e)))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        self.lock()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| AppError::Storage(format!("Failed to remove key '{}': {}", key, e)))?;
        Ok(())
    }
}
