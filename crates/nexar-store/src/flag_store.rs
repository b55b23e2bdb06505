//! Raw flag storage
//!
//! [`FlagStore`] is the browser-storage shaped seam: string keys, string
//! values, key enumeration. Access is synchronous. Each key is independent,
//! so writers racing on different keys never interfere and writers racing on
//! the same key resolve last-writer-wins.

use crate::error::{StoreError, StoreResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

/// String-keyed persistent storage
pub trait FlagStore: Send + Sync + Debug {
    /// Read a value
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// All keys currently stored
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// In-process flag store
///
/// Used for tests and for hosts without durable storage. An optional key
/// quota reproduces storage-full failures; it holds under concurrent writers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    quota: Option<usize>,
    occupied: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty, unbounded store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that refuses new keys beyond `limit`
    #[inline]
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            quota: Some(limit),
            occupied: AtomicUsize::new(0),
        }
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FlagStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(value.to_string());
            }
            Entry::Vacant(entry) => {
                // The slot is claimed while the shard is locked
                let limit = self.quota.unwrap_or(usize::MAX);
                self.occupied
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < limit).then_some(n + 1)
                    })
                    .map_err(|_| StoreError::QuotaExceeded {
                        key: key.to_string(),
                        limit,
                    })?;
                entry.insert(value.to_string());
            }
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        if self.entries.remove(key).is_some() {
            self.occupied.fetch_sub(1, Ordering::AcqRel);
        }
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}
