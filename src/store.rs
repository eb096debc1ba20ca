use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::app_dirs::AppDirs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw string key-value backend.
pub trait KeyValueStore: std::fmt::Debug {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_raw(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn delete(&mut self, key: &str) -> StoreResult<()>;
}

/// Backend kept in a single SQLite table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(SqliteStore { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_raw(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON values over a key-value backend.
///
/// Failures never escape: reads fall back to the caller's default and writes
/// report a boolean, so typing keeps working with no usable disk.
#[derive(Debug)]
pub struct Storage {
    backend: Box<dyn KeyValueStore>,
    persistent: bool,
}

impl Storage {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            persistent: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// SQLite at `path`, or memory-only if it cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        match SqliteStore::open(&path) {
            Ok(store) => Self {
                backend: Box::new(store),
                persistent: true,
            },
            Err(e) => {
                tracing::warn!(path = %path.as_ref().display(), error = %e, "falling back to in-memory storage");
                Self::in_memory()
            }
        }
    }

    pub fn open_default() -> Self {
        match AppDirs::db_path() {
            Some(path) => Self::open(path),
            None => {
                tracing::warn!("no application directory available, results will not persist");
                Self::in_memory()
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key = key, error = %e, "failed to read from storage");
                default
            }
        }
    }

    fn try_get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.backend.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| self.backend.set_raw(key, &raw));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = key, error = %e, "failed to write to storage");
                false
            }
        }
    }

    /// Write an already serialized value.
    pub fn set_raw(&mut self, key: &str, raw: &str) -> bool {
        match self.backend.set_raw(key, raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = key, error = %e, "failed to write to storage");
                false
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        match self.backend.delete(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = key, error = %e, "failed to delete from storage");
                false
            }
        }
    }
}
