//! Repository Cache - durable single-slot cache for the formatted listing
//!
//! The cache holds at most one listing. It is stored under three string keys:
//! - `github_repos_cache`: JSON array of display repositories
//! - `github_repos_cache_timestamp`: millisecond epoch of the last write
//! - `github_repos_cache_account`: username the listing belongs to (may be empty)
//!
//! Reads and writes never fail from the caller's point of view. Backend
//! errors are logged and reported as a miss (read) or skipped (write).

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::models::{CacheEntry, DisplayRepository};

pub const CACHE_KEY: &str = "github_repos_cache";
pub const CACHE_TIMESTAMP_KEY: &str = "github_repos_cache_timestamp";
pub const CACHE_ACCOUNT_KEY: &str = "github_repos_cache_account";

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache: {0}")]
    Read(String),

    #[error("Failed to write cache: {0}")]
    Write(String),

    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// String key/value storage behind the cache.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write all entries together; either every key is updated or none.
    fn put_all(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store that survives process restarts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the cache database at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::Write(format!(
                    "failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(&path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        info!("Cache database opened at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Cache schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Read("cache connection lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                r#"
                INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3
                "#,
                params![key, value, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Read("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put_all(&self, new_entries: &[(&str, &str)]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Write("memory store lock poisoned".to_string()))?;
        for (key, value) in new_entries {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Write("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Snapshot of the cache for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub stored_at: Option<DateTime<Utc>>,
    pub age: Option<Duration>,
    pub entries: Option<usize>,
    pub account: Option<String>,
    pub valid: bool,
}

/// Single-slot cache of the formatted repository listing.
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, timeout_ms: u64) -> Self {
        Self {
            store,
            clock,
            timeout: Duration::milliseconds(i64::try_from(timeout_ms).unwrap_or(i64::MAX)),
        }
    }

    /// True iff something was stored and `now - stored_at < timeout`.
    pub fn is_valid(&self) -> bool {
        match self.stored_at() {
            Some(stored_at) => self.clock.now() - stored_at < self.timeout,
            None => false,
        }
    }

    /// True iff the cache is valid and was written for `account`.
    pub fn is_valid_for(&self, account: &str) -> bool {
        self.is_valid() && self.stored_account().as_deref() == Some(account)
    }

    /// The stored entry regardless of age, or `None` on a miss or bad data.
    pub fn read(&self) -> Option<CacheEntry> {
        match self.try_read() {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring cached repositories: {}", e);
                None
            }
        }
    }

    /// Replace the cached listing, stamped with the current time. The
    /// entry is not tied to any account.
    pub fn write(&self, payload: &[DisplayRepository]) {
        self.write_for("", payload);
    }

    /// Replace the cached listing with one fetched for `account`.
    pub fn write_for(&self, account: &str, payload: &[DisplayRepository]) {
        match self.try_write(account, payload) {
            Ok(()) => debug!("Cached {} repositories", payload.len()),
            Err(e) => warn!("Failed to cache repositories: {}", e),
        }
    }

    /// Remove the cached listing.
    pub fn clear(&self) {
        for key in [CACHE_KEY, CACHE_TIMESTAMP_KEY, CACHE_ACCOUNT_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to clear cache key {}: {}", key, e);
            }
        }
    }

    pub fn status(&self) -> CacheStatus {
        let stored_at = self.stored_at();
        let entry = self.read();
        CacheStatus {
            stored_at,
            age: stored_at.map(|at| self.clock.now() - at),
            entries: entry.as_ref().map(|entry| entry.payload.len()),
            account: entry.and_then(|entry| entry.account),
            valid: self.is_valid(),
        }
    }

    fn stored_at(&self) -> Option<DateTime<Utc>> {
        match self.try_stored_at() {
            Ok(at) => at,
            Err(e) => {
                warn!("Ignoring cache timestamp: {}", e);
                None
            }
        }
    }

    fn stored_account(&self) -> Option<String> {
        match self.store.get(CACHE_ACCOUNT_KEY) {
            Ok(account) => account.filter(|a| !a.is_empty()),
            Err(e) => {
                warn!("Ignoring cache account: {}", e);
                None
            }
        }
    }

    fn try_stored_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(CACHE_TIMESTAMP_KEY)? else {
            return Ok(None);
        };
        let millis: i64 = raw
            .trim()
            .parse()
            .map_err(|_| CacheError::Corrupt(format!("timestamp {:?} is not a number", raw)))?;
        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| CacheError::Corrupt(format!("timestamp {} out of range", millis)))
    }

    fn try_read(&self) -> Result<Option<CacheEntry>> {
        let Some(stored_at) = self.try_stored_at()? else {
            return Ok(None);
        };
        let Some(json) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };
        let payload: Vec<DisplayRepository> =
            serde_json::from_str(&json).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        let account = self.store.get(CACHE_ACCOUNT_KEY)?.filter(|a| !a.is_empty());
        Ok(Some(CacheEntry {
            payload,
            stored_at,
            account,
        }))
    }

    fn try_write(&self, account: &str, payload: &[DisplayRepository]) -> Result<()> {
        let json = serde_json::to_string(payload).map_err(|e| CacheError::Write(e.to_string()))?;
        let millis = self.clock.now().timestamp_millis().to_string();
        self.store.put_all(&[
            (CACHE_KEY, json.as_str()),
            (CACHE_TIMESTAMP_KEY, millis.as_str()),
            (CACHE_ACCOUNT_KEY, account),
        ])
    }
}
