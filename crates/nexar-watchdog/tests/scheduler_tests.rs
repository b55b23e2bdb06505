use nexar_core::{FailureKind, FeatureId};
use nexar_store::MemoryStore;
use nexar_test_utils::{FakePage, Harness, ScriptedRandom};
use nexar_watchdog::{Cadence, DelayRange};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

async fn advance_to(start: tokio::time::Instant, ms: u64) {
    tokio::time::sleep_until(start + Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn boot_check_then_both_recurring_checks() {
    // boot 1000 + 500, primary 60000 + 1000, secondary 30000 + 2000
    let h = Harness::new(ScriptedRandom::new().with_below([500, 1_000, 2_000]));
    let start = tokio::time::Instant::now();
    let handles = h.watchdog.start();

    advance_to(start, 1_499).await;
    assert_eq!(h.page.inspections(), 0);

    advance_to(start, 1_501).await;
    assert_eq!(h.page.inspections(), 1);

    // secondary first tick at 1500 + 32000
    advance_to(start, 33_499).await;
    assert_eq!(h.page.inspections(), 1);
    advance_to(start, 33_501).await;
    assert_eq!(h.page.inspections(), 2);

    // primary first tick at 1500 + 61000
    advance_to(start, 62_501).await;
    assert_eq!(h.page.inspections(), 3);

    // secondary second tick at 1500 + 64000
    advance_to(start, 65_501).await;
    assert_eq!(h.page.inspections(), 4);

    let sleeps = h.clock.sleeps();
    assert_eq!(sleeps[0], Duration::from_millis(1_500));
    assert!(sleeps.contains(&Duration::from_millis(61_000)));
    assert!(sleeps.contains(&Duration::from_millis(32_000)));
    assert!(h.sink.records().is_empty());

    handles.abort();
}

#[tokio::test(start_paused = true)]
async fn drawn_delays_stay_in_their_ranges() {
    let h = Harness::new(ScriptedRandom::new().with_below([u64::MAX, u64::MAX, u64::MAX]));
    let handles = h.watchdog.start();
    sleep(Duration::from_millis(3_000)).await;

    let cadence = Cadence::default();
    let sleeps = h.clock.sleeps();
    assert!(cadence.boot.contains(sleeps[0]));
    assert_eq!(sleeps[0], Duration::from_millis(2_999));
    assert!(sleeps.contains(&Duration::from_millis(179_999)));
    assert!(sleeps.contains(&Duration::from_millis(89_999)));

    // boot, primary and secondary ranges, in draw order
    assert_eq!(h.random.bounds(), vec![2_000, 120_000, 60_000]);

    h.random.push_below(u64::MAX);
    h.random.push_below(u64::MAX);
    h.watchdog.report(FailureKind::FooterMissing);
    h.watchdog.settle().await;

    assert_eq!(h.random.bounds()[3..5], [1_000_000, 5_000]);
    assert!(h.clock.sleeps().contains(&Duration::from_millis(4_999)));
    handles.abort();
}

#[tokio::test(start_paused = true)]
async fn boot_redegrades_a_previously_failed_profile() {
    let h = Harness::new(ScriptedRandom::new());
    h.store.raise(nexar_core::FlagKey::IntegrityFailed).unwrap();
    let handles = h.watchdog.start();

    sleep(Duration::from_millis(1_001)).await;

    assert_eq!(h.page.inspections(), 1);
    assert!(h.sink.records().is_empty());
    assert_eq!(
        h.store.disabled_features().unwrap().into_iter().collect::<Vec<_>>(),
        vec![FeatureId::AddListing]
    );
    handles.abort();
}

#[tokio::test(start_paused = true)]
async fn recurring_checks_wait_for_boot() {
    let cadence = Cadence {
        boot: DelayRange::new(10_000, 10_001),
        primary: DelayRange::new(1_000, 1_001),
        secondary: None,
        ..Cadence::default()
    };
    let h = Harness::with_cadence(
        ScriptedRandom::new(),
        FakePage::intact(),
        Arc::new(MemoryStore::new()),
        cadence,
    );
    let start = tokio::time::Instant::now();
    let handles = h.watchdog.start();
    assert!(handles.secondary.is_none());

    advance_to(start, 9_999).await;
    assert_eq!(h.page.inspections(), 0);

    advance_to(start, 10_001).await;
    assert_eq!(h.page.inspections(), 1);

    advance_to(start, 11_001).await;
    assert_eq!(h.page.inspections(), 2);
    handles.abort();
}

#[tokio::test(start_paused = true)]
async fn aborted_scheduler_stops_checking() {
    let h = Harness::new(ScriptedRandom::new());
    let handles = h.watchdog.start();

    sleep(Duration::from_millis(1_001)).await;
    assert_eq!(h.page.inspections(), 1);

    handles.abort();
    sleep(Duration::from_secs(600)).await;
    assert_eq!(h.page.inspections(), 1);
}

#[tokio::test(start_paused = true)]
async fn recurring_failure_reports_and_degrades() {
    let h = Harness::new(ScriptedRandom::new());
    let handles = h.watchdog.start();

    sleep(Duration::from_millis(1_001)).await;
    h.remove_footer();

    // secondary fires at 1000 + 30000
    sleep(Duration::from_millis(30_000)).await;
    h.watchdog.settle().await;

    assert_eq!(h.sink.records().len(), 1);
    assert!(h.watchdog.gate().is_app_modified());
    handles.abort();
}

#[tokio::test(start_paused = true)]
async fn panicking_boot_check_reports_and_still_arms() {
    let page = FakePage::intact();
    page.panic_once();
    let h = Harness::with(ScriptedRandom::new(), page, Arc::new(MemoryStore::new()));
    let handles = h.watchdog.start();

    sleep(Duration::from_millis(1_001)).await;
    h.watchdog.settle().await;

    assert_eq!(h.page.inspections(), 1);
    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].full_error.contains("FOOTER_CHECK_ERROR"));
    assert!(h.watchdog.status().unwrap().system_error.is_some());

    // secondary fires at 1000 + 30000 against the now healthy page
    sleep(Duration::from_millis(30_000)).await;
    h.watchdog.settle().await;

    assert_eq!(h.page.inspections(), 2);
    assert_eq!(h.sink.records().len(), 1);
    handles.abort();
}
