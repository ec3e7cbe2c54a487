//! Pluggable token storage.
//!
//! The token lifecycle manager persists tokens and their metadata through
//! this seam. The in-memory implementation suits single-process deployments
//! and tests; production systems can implement [`TokenStorage`] over Redis,
//! a database, or a secrets manager.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::StorageError;

/// Key-value storage for tokens and token metadata.
///
/// Values carry an optional time-to-live; an expired entry behaves exactly
/// like a missing one.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Fetch a value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a value, replacing any previous entry for the key.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Instant::now() > expires_at)
    }
}

/// In-memory token storage with TTL support.
///
/// Expired entries are evicted lazily on read.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryTokenStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        {
            let entries = self.entries.read().map_err(lock_error)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Entry exists but has expired; evict it under the write lock.
        let mut entries = self.entries.write().map_err(lock_error)?;
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(lock_error)?;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(lock_error)?;
        entries.remove(key);
        Ok(())
    }
}

fn lock_error<T>(error: PoisonError<T>) -> StorageError {
    StorageError::OperationFailed {
        message: format!("failed to acquire storage lock: {error}"),
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
