//! File-backed flag store
//!
//! Persists the whole flag map as one JSON object. The file plays the role of
//! the browser profile: state survives restarts of the hosting process as
//! long as the same path is reopened.

use crate::error::{StoreError, StoreResult};
use crate::flag_store::FlagStore;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON-file flag store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StoreError::io_error(path, err)),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened flag store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` and persist; in-memory state is only updated once the
    /// file write succeeded
    fn write_through<F>(&self, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut guard = self.entries.lock();
        let mut next = guard.clone();
        mutate(&mut next);
        if next == *guard {
            return Ok(());
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io_error(parent, err))?;
        }
        let bytes = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|err| StoreError::io_error(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::io_error(&self.path, err))
    }
}

impl FlagStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write_through(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.write_through(|entries| {
            entries.remove(key);
        })
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("profile").join("flags.json")).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile").join("flags.json");

        let store = FileStore::open(&path).unwrap();
        store.set("__nx_integrity_failed", "true").unwrap();
        store.set("__nx_disabled_search", "true").unwrap();
        store.remove("__nx_disabled_search").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("__nx_integrity_failed").unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get("__nx_disabled_search").unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flags.json");
        fs::write(&path, b"not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = TempDir::new().unwrap();
        // A directory at the target path makes the rename fail
        let path = dir.path().join("flags.json");
        fs::create_dir(&path).unwrap();

        let store = FileStore {
            path: path.clone(),
            entries: Mutex::new(BTreeMap::new()),
        };
        assert!(store.set("a", "1").is_err());
        assert_eq!(store.get("a").unwrap(), None);
    }
}
