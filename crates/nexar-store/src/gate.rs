//! Feature gate
//!
//! Read-only queries for the UI layer. Every query fails open: unreadable
//! storage reads as "not disabled".

use crate::integrity::IntegrityStore;
use nexar_core::{disabled_key, FLAG_TRUE};
use tracing::debug;

/// Fail-open feature queries
#[derive(Debug, Clone)]
pub struct FeatureGate {
    store: IntegrityStore,
}

impl FeatureGate {
    /// Create a gate over the given store
    #[must_use]
    pub fn new(store: IntegrityStore) -> Self {
        Self { store }
    }

    /// Whether `feature_id` is disabled
    ///
    /// Accepts any id; ids outside the catalog are simply never disabled by
    /// the watchdog.
    #[must_use]
    pub fn is_disabled(&self, feature_id: &str) -> bool {
        match self.store.raw().get(&disabled_key(feature_id)) {
            Ok(value) => value.as_deref() == Some(FLAG_TRUE),
            Err(err) => {
                debug!(feature_id, error = %err, "feature gate read failed");
                false
            }
        }
    }

    /// Whether integrity has failed since the last reset
    #[must_use]
    pub fn is_app_modified(&self) -> bool {
        self.store.integrity_failed().unwrap_or(false)
    }
}
