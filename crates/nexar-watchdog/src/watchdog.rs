//! Assembled watchdog
//!
//! [`WatchdogBuilder`] wires the components together with production
//! defaults for everything a host does not supply:
//!
//! | Part | Default |
//! |---|---|
//! | flag store | [`MemoryStore`] |
//! | log sink | [`NullLogSink`] |
//! | randomness | [`ThreadRandom`] |
//! | clock | [`TokioClock`] |
//!
//! The settings source and the page inspector have no default.

use crate::config::{Cadence, WatchdogConfig};
use crate::degrade::DegradationController;
use crate::entropy::{Clock, RandomSource, ThreadRandom, TokioClock};
use crate::error::{WatchdogError, WatchdogResult};
use crate::inspect::PageInspector;
use crate::reporter::Reporter;
use crate::scheduler::{WatchdogHandles, WatchdogScheduler};
use crate::validation::{Catalog, CatalogValidator};
use crate::verifier::IntegrityVerifier;
use nexar_backend::{AttributionSettings, LogSink, NullLogSink, SettingKeys, SettingsSource};
use nexar_core::{DiagnosticCode, FailureKind};
use nexar_store::{FeatureGate, FlagStore, IntegritySnapshot, IntegrityStore, MemoryStore, StoreResult};
use std::sync::Arc;

/// A fully wired watchdog
#[derive(Debug, Clone)]
pub struct Watchdog {
    store: IntegrityStore,
    settings: Arc<AttributionSettings>,
    reporter: Arc<Reporter>,
    verifier: IntegrityVerifier,
    scheduler: WatchdogScheduler,
}

impl Watchdog {
    /// Start building a watchdog
    #[inline]
    #[must_use]
    pub fn builder() -> WatchdogBuilder {
        WatchdogBuilder::new()
    }

    /// Start the boot check and both recurring checks
    pub fn start(&self) -> WatchdogHandles {
        self.scheduler.start()
    }

    /// Run one check, reporting any failure
    pub async fn verify(&self) -> bool {
        self.verifier.verify().await
    }

    /// Report a failure directly
    pub fn report(&self, kind: FailureKind) -> DiagnosticCode {
        self.reporter.report(kind)
    }

    /// Wait for outstanding log writes and degradations
    pub async fn settle(&self) {
        self.reporter.settle().await;
    }

    /// Fail-open feature queries over this watchdog's store
    #[must_use]
    pub fn gate(&self) -> FeatureGate {
        FeatureGate::new(self.store.clone())
    }

    /// Validator reporting through this watchdog
    #[must_use]
    pub fn validator(&self, catalog: Catalog) -> CatalogValidator {
        CatalogValidator::new(catalog, Arc::clone(&self.reporter))
    }

    /// Persisted state
    ///
    /// # Errors
    /// When the store cannot be read.
    pub fn status(&self) -> StoreResult<IntegritySnapshot> {
        self.store.snapshot()
    }

    /// Clear all persisted state
    ///
    /// # Errors
    /// When the store cannot be written.
    pub fn reset(&self) -> StoreResult<usize> {
        self.store.reset()
    }

    /// Typed store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &IntegrityStore {
        &self.store
    }

    /// Memoized attribution settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &Arc<AttributionSettings> {
        &self.settings
    }

    /// Failure reporter
    #[inline]
    #[must_use]
    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// Verifier
    #[inline]
    #[must_use]
    pub fn verifier(&self) -> &IntegrityVerifier {
        &self.verifier
    }
}

/// Builder for [`Watchdog`]
#[derive(Default)]
pub struct WatchdogBuilder {
    cadence: Cadence,
    setting_keys: SettingKeys,
    store: Option<Arc<dyn FlagStore>>,
    settings_source: Option<Arc<dyn SettingsSource>>,
    log_sink: Option<Arc<dyn LogSink>>,
    inspector: Option<Arc<dyn PageInspector>>,
    random: Option<Arc<dyn RandomSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl std::fmt::Debug for WatchdogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchdogBuilder")
            .field("cadence", &self.cadence)
            .field("setting_keys", &self.setting_keys)
            .field("store", &self.store)
            .field("has_settings_source", &self.settings_source.is_some())
            .field("has_inspector", &self.inspector.is_some())
            .finish_non_exhaustive()
    }
}

impl WatchdogBuilder {
    /// Create builder with default cadence and setting keys
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take cadence and setting keys from configuration
    #[must_use]
    pub fn config(mut self, config: &WatchdogConfig) -> Self {
        self.cadence = config.cadence.clone();
        self.setting_keys = config.setting_keys.clone();
        self
    }

    /// Set timer ranges
    #[inline]
    #[must_use]
    pub fn cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Set the profile flag store
    #[inline]
    #[must_use]
    pub fn store(mut self, store: Arc<dyn FlagStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set where attribution rows come from
    #[inline]
    #[must_use]
    pub fn settings_source(mut self, source: Arc<dyn SettingsSource>) -> Self {
        self.settings_source = Some(source);
        self
    }

    /// Set the remote log sink
    #[inline]
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Set the page inspector
    #[inline]
    #[must_use]
    pub fn inspector(mut self, inspector: Arc<dyn PageInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Set the random source
    #[inline]
    #[must_use]
    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    /// Set the clock
    #[inline]
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the watchdog on the current tokio runtime
    ///
    /// # Errors
    /// Missing settings source or inspector, an invalid cadence, or no
    /// runtime.
    pub fn build(self) -> WatchdogResult<Watchdog> {
        self.cadence.validate()?;
        let source = self
            .settings_source
            .ok_or(WatchdogError::MissingComponent("settings source"))?;
        let inspector = self
            .inspector
            .ok_or(WatchdogError::MissingComponent("page inspector"))?;

        let store = IntegrityStore::new(self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())));
        let random = self.random.unwrap_or_else(|| Arc::new(ThreadRandom));
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));
        let sink = self.log_sink.unwrap_or_else(|| Arc::new(NullLogSink));

        let settings = Arc::new(AttributionSettings::new(source, self.setting_keys));
        let controller = DegradationController::new(store.clone(), Arc::clone(&random), Arc::clone(&clock));
        let reporter = Arc::new(Reporter::new(
            sink,
            controller,
            Arc::clone(&random),
            Arc::clone(&clock),
            self.cadence.degradation_delay,
        )?);
        let verifier = IntegrityVerifier::new(Arc::clone(&settings), inspector, Arc::clone(&reporter));
        let scheduler = WatchdogScheduler::new(verifier.clone(), random, clock, self.cadence);

        Ok(Watchdog {
            store,
            settings,
            reporter,
            verifier,
            scheduler,
        })
    }
}
