//! Typed integrity state
//!
//! [`IntegrityStore`] is the only way the watchdog touches persisted state:
//! call sites speak [`FlagKey`], never raw strings.

use crate::error::StoreResult;
use crate::flag_store::{FlagStore, MemoryStore};
use nexar_core::{FeatureId, FlagKey, DISABLED_PREFIX, FLAG_TRUE};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Typed view over a [`FlagStore`]
#[derive(Debug, Clone)]
pub struct IntegrityStore {
    inner: Arc<dyn FlagStore>,
}

/// Point-in-time view of everything the watchdog has persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegritySnapshot {
    /// Integrity failed at least once since the last reset
    pub integrity_failed: bool,
    /// Features currently disabled
    pub disabled: BTreeSet<FeatureId>,
    /// Last recorded check-error code
    pub system_error: Option<String>,
    /// Last recorded unclassified failure code
    pub unknown_error: Option<String>,
    /// Cache-corruption timestamp, if any
    pub cache_corrupted: Option<String>,
    /// Catalog data validation failed
    pub data_validation_failed: bool,
}

impl IntegrityStore {
    /// Wrap a raw flag store
    #[must_use]
    pub fn new(inner: Arc<dyn FlagStore>) -> Self {
        Self { inner }
    }

    /// Store backed by a fresh [`MemoryStore`]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Underlying raw store
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &dyn FlagStore {
        self.inner.as_ref()
    }

    /// Read a flag value
    pub fn get_flag(&self, key: FlagKey) -> StoreResult<Option<String>> {
        self.inner.get(&key.as_key())
    }

    /// Write a flag value
    pub fn set_flag(&self, key: FlagKey, value: &str) -> StoreResult<()> {
        self.inner.set(&key.as_key(), value)
    }

    /// Write a boolean flag as `"true"`
    pub fn raise(&self, key: FlagKey) -> StoreResult<()> {
        self.set_flag(key, FLAG_TRUE)
    }

    /// Whether a boolean flag reads `"true"`
    pub fn is_raised(&self, key: FlagKey) -> StoreResult<bool> {
        Ok(self.get_flag(key)?.as_deref() == Some(FLAG_TRUE))
    }

    /// Delete a flag
    pub fn remove_flag(&self, key: FlagKey) -> StoreResult<()> {
        self.inner.remove(&key.as_key())
    }

    /// Raw keys starting with `prefix`, sorted
    pub fn list_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .inner
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Delete every key starting with `prefix`; returns how many were removed
    pub fn clear_by_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let keys = self.list_by_prefix(prefix)?;
        for key in &keys {
            self.inner.remove(key)?;
        }
        Ok(keys.len())
    }

    /// Whether integrity failed in this or an earlier session
    pub fn integrity_failed(&self) -> StoreResult<bool> {
        self.is_raised(FlagKey::IntegrityFailed)
    }

    /// Mark one feature as disabled
    pub fn disable_feature(&self, feature: FeatureId) -> StoreResult<()> {
        self.raise(FlagKey::Disabled(feature))
    }

    /// Catalog features currently disabled
    pub fn disabled_features(&self) -> StoreResult<BTreeSet<FeatureId>> {
        let mut disabled = BTreeSet::new();
        for key in self.list_by_prefix(DISABLED_PREFIX)? {
            if let Some(FlagKey::Disabled(feature)) = FlagKey::parse(&key) {
                if self.inner.get(&key)?.as_deref() == Some(FLAG_TRUE) {
                    disabled.insert(feature);
                }
            }
        }
        Ok(disabled)
    }

    /// Read every watchdog flag at once
    pub fn snapshot(&self) -> StoreResult<IntegritySnapshot> {
        Ok(IntegritySnapshot {
            integrity_failed: self.integrity_failed()?,
            disabled: self.disabled_features()?,
            system_error: self.get_flag(FlagKey::SystemError)?,
            unknown_error: self.get_flag(FlagKey::UnknownError)?,
            cache_corrupted: self.get_flag(FlagKey::CacheCorrupted)?,
            data_validation_failed: self.is_raised(FlagKey::DataValidationFailed)?,
        })
    }

    /// Clear all watchdog state
    ///
    /// Removes the fixed keys and every `__nx_disabled_*` key, including ids
    /// outside the catalog. Returns the number of disabled-feature keys
    /// removed.
    pub fn reset(&self) -> StoreResult<usize> {
        for key in FlagKey::FIXED {
            self.remove_flag(key)?;
        }
        let cleared = self.clear_by_prefix(DISABLED_PREFIX)?;
        info!(cleared, "integrity state reset");
        Ok(cleared)
    }
}

impl From<Arc<dyn FlagStore>> for IntegrityStore {
    fn from(inner: Arc<dyn FlagStore>) -> Self {
        Self::new(inner)
    }
}
