//! Degradation controller
//!
//! Turns a reported failure into persisted state. Integrity failures mark the
//! profile as modified and disable a random handful of features; the other
//! kinds only leave a diagnostic trace. Disabled features accumulate across
//! passes and sessions until an explicit reset.

use crate::entropy::{Clock, RandomSource};
use nexar_core::{DiagnosticCode, FailureClass, FailureKind, FeatureId, FlagKey};
use nexar_store::{IntegrityStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest number of features one pass may disable
pub const MAX_PER_PASS: u64 = 3;

/// Probability of writing the cache-corruption marker on any failure
pub const CACHE_CORRUPTION_CHANCE: f64 = 0.5;

/// Result of one degradation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegradationPass {
    /// Features the pass drew before clamping to what was left
    pub requested: usize,
    /// Features newly disabled
    pub disabled: Vec<FeatureId>,
    /// Features whose disabled flag could not be written
    pub failed: Vec<FeatureId>,
}

/// Everything one `try_apply` changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegradationOutcome {
    /// Pass run for integrity failures
    pub pass: Option<DegradationPass>,
    /// Whether the cache-corruption marker was written
    pub cache_corrupted: bool,
}

/// Applies failure consequences to the profile store
#[derive(Debug, Clone)]
pub struct DegradationController {
    store: IntegrityStore,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl DegradationController {
    /// Create a controller
    #[must_use]
    pub fn new(store: IntegrityStore, random: Arc<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self { store, random, clock }
    }

    /// Store the controller writes to
    #[inline]
    #[must_use]
    pub fn store(&self) -> &IntegrityStore {
        &self.store
    }

    /// Apply `kind`, swallowing storage errors
    pub fn apply(&self, kind: &FailureKind, code: DiagnosticCode) {
        if let Err(err) = self.try_apply(kind, code) {
            warn!(kind = %kind, error = %err, "degradation could not be persisted");
        }
    }

    /// Apply `kind` and report what changed
    ///
    /// # Errors
    /// The first failed write of a fixed flag. Individual feature writes
    /// inside a pass never abort it; they are listed in
    /// [`DegradationPass::failed`].
    pub fn try_apply(
        &self,
        kind: &FailureKind,
        code: DiagnosticCode,
    ) -> Result<DegradationOutcome, StoreError> {
        let mut outcome = DegradationOutcome::default();

        match kind.class() {
            FailureClass::Integrity => {
                self.store.raise(FlagKey::IntegrityFailed)?;
                self.store.raise(FlagKey::FeaturesDisabled)?;
                outcome.pass = Some(self.degrade());
            }
            FailureClass::SystemError => {
                self.store.set_flag(FlagKey::SystemError, &code.to_string())?;
            }
            FailureClass::DataValidation => {
                self.store.raise(FlagKey::DataValidationFailed)?;
            }
            FailureClass::Unknown => {
                self.store.set_flag(FlagKey::UnknownError, &code.to_string())?;
            }
        }

        if self.random.chance(CACHE_CORRUPTION_CHANCE) {
            let stamp = self.clock.now().timestamp_millis().to_string();
            self.store.set_flag(FlagKey::CacheCorrupted, &stamp)?;
            outcome.cache_corrupted = true;
        }

        debug!(kind = %kind, code = %code, cache_corrupted = outcome.cache_corrupted, "failure applied");
        Ok(outcome)
    }

    /// Disable between one and three features not yet disabled
    pub fn degrade(&self) -> DegradationPass {
        let already = match self.store.disabled_features() {
            Ok(already) => already,
            Err(err) => {
                warn!(error = %err, "disabled set unreadable, drawing from full catalog");
                Default::default()
            }
        };
        let mut pool: Vec<FeatureId> = FeatureId::CATALOG
            .into_iter()
            .filter(|feature| !already.contains(feature))
            .collect();

        let requested = usize::try_from(1 + self.random.below(MAX_PER_PASS)).unwrap_or(1);
        let mut pass = DegradationPass {
            requested,
            ..DegradationPass::default()
        };

        for _ in 0..requested.min(pool.len()) {
            let bound = u64::try_from(pool.len()).unwrap_or(u64::MAX);
            let index = usize::try_from(self.random.below(bound)).unwrap_or_default();
            let feature = pool.remove(index);
            match self.store.disable_feature(feature) {
                Ok(()) => pass.disabled.push(feature),
                Err(err) => {
                    warn!(feature = %feature, error = %err, "feature flag write failed");
                    pass.failed.push(feature);
                }
            }
        }

        info!(
            requested,
            disabled = ?pass.disabled,
            remaining = pool.len(),
            "degradation pass complete"
        );
        pass
    }
}
