//! Key-value storage of cached entries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use super::{CacheKey, CachedEntry};

/// Errors reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("cache store lock poisoned")]
    Poisoned,
}

/// Holds at most one entry per key.
///
/// `put` replaces the whole entry at once: a concurrent `get` observes
/// either the previous entry or the new one, never a mixture.
pub trait CacheStore: Send + Sync {
    /// Returns the entry currently stored under `key`.
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CachedEntry>>, StoreError>;

    /// Stores `entry` under `key`, replacing any previous entry.
    fn put(&self, key: CacheKey, entry: CachedEntry) -> Result<(), StoreError>;
}

/// In-process store. Entries are shared as `Arc`s and swapped under a lock,
/// so readers clone out a handle and never hold the lock while serving.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, Arc<CachedEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CachedEntry>>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: CacheKey, entry: CachedEntry) -> Result<(), StoreError> {
        let entry = Arc::new(entry);
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key, entry);
        Ok(())
    }
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CachedEntry>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: CacheKey, entry: CachedEntry) -> Result<(), StoreError> {
        (**self).put(key, entry)
    }
}
