//! Testing utilities for the Nexar workspace
//!
//! Fakes for every collaborator the watchdog injects, page fixtures, and a
//! [`Harness`] that wires them into a [`Watchdog`].

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nexar_backend::{BackendError, LogSink, SettingKeys, SettingRow, SettingsSource};
use nexar_core::ErrorLogRecord;
use nexar_store::{FlagStore, IntegrityStore, MemoryStore, StoreError, StoreResult};
use nexar_watchdog::{
    Cadence, Clock, DocumentTree, Element, FooterRegion, InspectError, PageInspector, RandomSource,
    Watchdog,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const REQUIRED_TEXT: &str = "Dezvoltat de";
pub const REQUIRED_NAME: &str = "NEXT SOFT";
pub const LOGO_URL: &str = "https://i.ibb.co/4nWL8Bq/Next-Soft-Logo-ALB.png";
pub const LOGO_FRAGMENT: &str = "Next-Soft-Logo";

// ---------------------------------------------------------------------------
// Randomness and time
// ---------------------------------------------------------------------------

/// Replays queued draws; an empty queue yields 0 and `false`
///
/// Values larger than the requested bound are clamped to `bound - 1`.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    below: Mutex<VecDeque<u64>>,
    chance: Mutex<VecDeque<bool>>,
    bounds: Mutex<Vec<u64>>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue integer draws
    pub fn with_below(self, values: impl IntoIterator<Item = u64>) -> Self {
        self.below.lock().extend(values);
        self
    }

    /// Queue coin flips
    pub fn with_chance(self, values: impl IntoIterator<Item = bool>) -> Self {
        self.chance.lock().extend(values);
        self
    }

    pub fn push_below(&self, value: u64) {
        self.below.lock().push_back(value);
    }

    pub fn push_chance(&self, value: bool) {
        self.chance.lock().push_back(value);
    }

    /// Every bound passed to `below`, in call order
    pub fn bounds(&self) -> Vec<u64> {
        self.bounds.lock().clone()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&self, bound: u64) -> u64 {
        self.bounds.lock().push(bound);
        if bound == 0 {
            return 0;
        }
        let value = self.below.lock().pop_front().unwrap_or(0);
        value.min(bound - 1)
    }

    fn chance(&self, _probability: f64) -> bool {
        self.chance.lock().pop_front().unwrap_or(false)
    }
}

/// Tokio-backed clock recording every requested sleep
#[derive(Debug)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
    now: DateTime<Utc>,
}

impl Default for RecordingClock {
    fn default() -> Self {
        Self::at(fixed_now())
    }
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose wall time is always `now`
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            sleeps: Mutex::new(Vec::new()),
            now,
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// 2026-03-01T12:00:00Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Settings source serving fixed rows
#[derive(Debug)]
pub struct StaticSettings {
    rows: Mutex<Vec<SettingRow>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticSettings {
    pub fn new(rows: Vec<SettingRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// The three attribution rows under the default keys
    pub fn attribution() -> Self {
        Self::new(attribution_rows())
    }

    pub fn set_rows(&self, rows: Vec<SettingRow>) {
        *self.rows.lock() = rows;
    }

    /// Make every fetch fail with a 503
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn fetch_settings(&self, keys: &[&str]) -> Result<Vec<SettingRow>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::status(503, "service unavailable"));
        }
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| keys.contains(&row.key.as_str()))
            .cloned()
            .collect())
    }
}

pub fn attribution_rows() -> Vec<SettingRow> {
    let keys = SettingKeys::default();
    vec![
        SettingRow::new(keys.text, REQUIRED_TEXT),
        SettingRow::new(keys.name, REQUIRED_NAME),
        SettingRow::new(keys.logo_url, LOGO_FRAGMENT),
    ]
}

/// Log sink keeping every record
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    records: Mutex<Vec<ErrorLogRecord>>,
    failing: AtomicBool,
}

impl RecordingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<ErrorLogRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl LogSink for RecordingLogSink {
    async fn append(&self, record: &ErrorLogRecord) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::status(500, "insert failed"));
        }
        self.records.lock().push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// Footer carrying text, name and logo
pub fn attributed_footer() -> Element {
    Element::new("footer")
        .with_child(Element::new("p").with_text("© 2026 Nexar. "))
        .with_child(
            Element::new("a")
                .with_attr("href", "https://nextsoft.ro")
                .with_text(format!("{REQUIRED_TEXT} "))
                .with_child(Element::new("span").with_text(REQUIRED_NAME))
                .with_child(Element::image(LOGO_URL)),
        )
}

/// Page body with the given footer, or none
pub fn page(footer: Option<Element>) -> Element {
    let body = Element::new("body")
        .with_child(Element::new("header").with_text("Nexar"))
        .with_child(Element::new("main").with_text("Anunturi"));
    match footer {
        Some(footer) => body.with_child(footer),
        None => body,
    }
}

pub fn intact_page() -> Element {
    page(Some(attributed_footer()))
}

/// Live document counting inspections, optionally failing them
#[derive(Debug, Default)]
pub struct FakePage {
    document: DocumentTree,
    inspections: AtomicUsize,
    failing: AtomicBool,
    panic_next: AtomicBool,
}

impl FakePage {
    pub fn new(root: Element) -> Self {
        Self {
            document: DocumentTree::new(root),
            inspections: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            panic_next: AtomicBool::new(false),
        }
    }

    pub fn intact() -> Self {
        Self::new(intact_page())
    }

    pub fn document(&self) -> &DocumentTree {
        &self.document
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The next inspection panics instead of returning
    pub fn panic_once(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    pub fn inspections(&self) -> usize {
        self.inspections.load(Ordering::SeqCst)
    }
}

impl PageInspector for FakePage {
    fn footer(&self) -> Result<Option<FooterRegion>, InspectError> {
        self.inspections.fetch_add(1, Ordering::SeqCst);
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("inspector blew up");
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(InspectError::Unavailable("document detached".to_string()));
        }
        self.document.footer()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Memory store that rejects writes to chosen keys, or everything
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing_keys: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails
    pub fn broken() -> Self {
        let store = Self::default();
        store.fail_all.store(true, Ordering::SeqCst);
        store
    }

    pub fn fail_writes_to(&self, key: impl Into<String>) {
        self.failing_keys.lock().insert(key.into());
    }

    fn check(&self, key: Option<&str>) -> StoreResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("storage disabled"));
        }
        if let Some(key) = key {
            if self.failing_keys.lock().contains(key) {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    limit: 0,
                });
            }
        }
        Ok(())
    }
}

impl FlagStore for FailingStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check(None)?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check(Some(key))?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.check(None)?;
        self.inner.remove(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.check(None)?;
        self.inner.keys()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Watchdog wired to fakes, with every fake reachable
pub struct Harness {
    pub watchdog: Watchdog,
    pub store: IntegrityStore,
    pub settings: Arc<StaticSettings>,
    pub sink: Arc<RecordingLogSink>,
    pub page: Arc<FakePage>,
    pub random: Arc<ScriptedRandom>,
    pub clock: Arc<RecordingClock>,
}

impl Harness {
    /// Intact page, default rows, scripted randomness; call inside a runtime
    pub fn new(random: ScriptedRandom) -> Self {
        Self::with(random, FakePage::intact(), Arc::new(MemoryStore::new()))
    }

    pub fn with(random: ScriptedRandom, page: FakePage, flags: Arc<dyn FlagStore>) -> Self {
        Self::with_cadence(random, page, flags, Cadence::default())
    }

    pub fn with_cadence(
        random: ScriptedRandom,
        page: FakePage,
        flags: Arc<dyn FlagStore>,
        cadence: Cadence,
    ) -> Self {
        let settings = Arc::new(StaticSettings::attribution());
        let sink = Arc::new(RecordingLogSink::new());
        let page = Arc::new(page);
        let random = Arc::new(random);
        let clock = Arc::new(RecordingClock::new());

        let watchdog = match Watchdog::builder()
            .cadence(cadence)
            .store(Arc::clone(&flags))
            .settings_source(settings.clone())
            .log_sink(sink.clone())
            .inspector(page.clone())
            .random(random.clone())
            .clock(clock.clone())
            .build()
        {
            Ok(watchdog) => watchdog,
            Err(err) => panic!("test harness failed to build: {err}"),
        };

        Self {
            store: watchdog.store().clone(),
            watchdog,
            settings,
            sink,
            page,
            random,
            clock,
        }
    }

    /// Remove the footer from the live page
    pub fn remove_footer(&self) {
        self.page
            .document()
            .update(|root| root.children.retain(|child| !child.is_footer()));
    }

    /// Replace the footer with `footer`
    pub fn replace_footer(&self, footer: Element) {
        self.page.document().replace(page(Some(footer)));
    }
}
