use nexar_backend::SettingRow;
use nexar_core::{FailureKind, FeatureId, FlagKey};
use nexar_store::{IntegritySnapshot, MemoryStore};
use nexar_test_utils::{
    attribution_rows, FailingStore, FakePage, Harness, ScriptedRandom, LOGO_URL, REQUIRED_NAME,
    REQUIRED_TEXT,
};
use nexar_watchdog::Element;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const FIXED_NOW_MS: &str = "1772366400000";

fn disabled(features: &[FeatureId]) -> BTreeSet<FeatureId> {
    features.iter().copied().collect()
}

#[tokio::test(start_paused = true)]
async fn intact_footer_passes_without_side_effects() {
    let h = Harness::new(ScriptedRandom::new());

    assert!(h.watchdog.verify().await);
    assert_eq!(h.watchdog.verifier().check().await, Ok(()));
    h.watchdog.settle().await;

    assert!(h.sink.records().is_empty());
    assert!(h.store.raw().keys().unwrap().is_empty());
    assert_eq!(h.watchdog.status().unwrap(), IntegritySnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn missing_footer_reports_once_then_degrades() {
    // code, degradation delay, n - 1, pool index
    let h = Harness::new(ScriptedRandom::new().with_below([0x1234, 100, 0, 0]));
    h.remove_footer();

    assert!(!h.watchdog.verify().await);
    assert!(!h.store.integrity_failed().unwrap());
    h.watchdog.settle().await;

    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].full_error,
        "[ERR-1234] FOOTER_MISSING at 2026-03-01T12:00:00.000Z"
    );
    assert_eq!(records[0].user_id, nexar_core::ANONYMOUS_USER);

    let snapshot = h.watchdog.status().unwrap();
    assert!(snapshot.integrity_failed);
    assert_eq!(snapshot.disabled, disabled(&[FeatureId::AddListing]));
    assert!(h.store.is_raised(FlagKey::FeaturesDisabled).unwrap());
    assert_eq!(snapshot.cache_corrupted, None);
    assert!(h.clock.sleeps().contains(&Duration::from_millis(100)));

    let gate = h.watchdog.gate();
    assert!(gate.is_app_modified());
    assert!(gate.is_disabled("add-listing"));
    assert!(!gate.is_disabled("search"));
}

#[tokio::test(start_paused = true)]
async fn name_missing_from_footer_is_modification() {
    let h = Harness::new(ScriptedRandom::new());
    h.replace_footer(
        Element::new("footer")
            .with_text(format!("{REQUIRED_TEXT} someone else"))
            .with_child(Element::image(LOGO_URL)),
    );

    assert_eq!(h.watchdog.verifier().check().await, Err(FailureKind::FooterModified));
    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;

    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].full_error.contains("FOOTER_MODIFIED"));
    assert!(h.store.integrity_failed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn footer_without_logo_is_logo_missing() {
    let h = Harness::new(ScriptedRandom::new());
    h.replace_footer(
        Element::new("footer")
            .with_text(format!("{REQUIRED_TEXT} {REQUIRED_NAME}"))
            .with_child(Element::image("https://cdn.example.com/other-logo.png")),
    );

    assert_eq!(h.watchdog.verifier().check().await, Err(FailureKind::LogoMissing));
}

#[tokio::test(start_paused = true)]
async fn partial_settings_fail_before_inspection() {
    let h = Harness::new(ScriptedRandom::new());
    h.settings.set_rows(attribution_rows().into_iter().take(2).collect());

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;

    assert_eq!(h.page.inspections(), 0);
    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].full_error.contains("SETTINGS_MISSING"));
    assert!(h.store.integrity_failed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn settings_fetch_error_is_settings_missing() {
    let h = Harness::new(ScriptedRandom::new());
    h.settings.set_failing(true);

    assert_eq!(h.watchdog.verifier().check().await, Err(FailureKind::SettingsMissing));
    assert_eq!(h.page.inspections(), 0);
}

#[tokio::test(start_paused = true)]
async fn inspection_error_records_system_error_only() {
    let h = Harness::new(ScriptedRandom::new().with_below([0xabc]));
    h.page.set_failing(true);

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;

    let snapshot = h.watchdog.status().unwrap();
    assert_eq!(snapshot.system_error.as_deref(), Some("abc"));
    assert!(!snapshot.integrity_failed);
    assert!(snapshot.disabled.is_empty());
    assert!(h.sink.records()[0].full_error.contains("FOOTER_CHECK_ERROR"));
}

#[tokio::test(start_paused = true)]
async fn panicking_inspector_is_check_error() {
    let h = Harness::new(ScriptedRandom::new().with_below([0x7f]));
    h.page.panic_once();

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;

    assert_eq!(h.watchdog.status().unwrap().system_error.as_deref(), Some("7f"));
    assert!(h.sink.records()[0].full_error.contains("FOOTER_CHECK_ERROR"));

    assert!(h.watchdog.verify().await);
}

#[tokio::test(start_paused = true)]
async fn config_is_fetched_once_until_invalidated() {
    let h = Harness::new(ScriptedRandom::new());

    for _ in 0..3 {
        assert!(h.watchdog.verify().await);
    }
    assert_eq!(h.settings.calls(), 1);

    h.watchdog.settings().invalidate();
    assert!(h.watchdog.verify().await);
    assert_eq!(h.settings.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_retried_next_check() {
    let h = Harness::new(ScriptedRandom::new());
    h.settings.set_failing(true);
    assert!(!h.watchdog.verify().await);

    h.settings.set_failing(false);
    assert!(h.watchdog.verify().await);
    assert_eq!(h.settings.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn pass_is_clamped_to_remaining_features() {
    // n - 1 = 2, then two pool indices
    let h = Harness::new(ScriptedRandom::new().with_below([2, 1, 0]));
    for feature in [
        FeatureId::AddListing,
        FeatureId::EditProfile,
        FeatureId::Search,
        FeatureId::Filter,
    ] {
        h.store.disable_feature(feature).unwrap();
    }

    let pass = h.watchdog.reporter().controller().degrade();

    assert_eq!(pass.requested, 3);
    assert_eq!(pass.disabled, vec![FeatureId::Login, FeatureId::Contact]);
    assert_eq!(h.store.disabled_features().unwrap().len(), FeatureId::CATALOG.len());
}

#[tokio::test(start_paused = true)]
async fn passes_compound_across_reports() {
    let h = Harness::new(ScriptedRandom::new());
    h.remove_footer();

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;
    let first = h.store.disabled_features().unwrap();

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;
    let second = h.store.disabled_features().unwrap();

    assert!(first.is_subset(&second));
    assert_eq!(first, disabled(&[FeatureId::AddListing]));
    assert_eq!(second, disabled(&[FeatureId::AddListing, FeatureId::EditProfile]));
    assert_eq!(h.sink.records().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn overlapping_checks_each_report() {
    let h = Harness::new(ScriptedRandom::new());
    h.remove_footer();

    let (a, b) = tokio::join!(h.watchdog.verify(), h.watchdog.verify());
    assert!(!a && !b);
    h.watchdog.settle().await;

    assert_eq!(h.sink.records().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_everything_and_failure_retriggers() {
    let h = Harness::new(ScriptedRandom::new().with_chance([true]));
    h.remove_footer();
    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;
    h.store.raw().set("__nx_disabled_legacy-widget", "true").unwrap();

    assert_eq!(
        h.store.get_flag(FlagKey::CacheCorrupted).unwrap().as_deref(),
        Some(FIXED_NOW_MS)
    );

    h.watchdog.reset().unwrap();
    assert!(h.store.raw().keys().unwrap().is_empty());
    let gate = h.watchdog.gate();
    assert!(!gate.is_app_modified());
    for feature in FeatureId::CATALOG {
        assert!(!gate.is_disabled(feature.as_str()));
    }

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;
    assert!(gate.is_app_modified());
    assert_eq!(h.store.disabled_features().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn signed_in_user_is_recorded() {
    let h = Harness::new(ScriptedRandom::new());
    let user = uuid::Uuid::from_u128(0x42);
    h.watchdog.reporter().set_user(Some(user));
    h.remove_footer();

    h.watchdog.verify().await;
    h.watchdog.settle().await;
    assert_eq!(h.sink.records()[0].user_id, user);
}

#[tokio::test(start_paused = true)]
async fn log_sink_failure_is_swallowed() {
    let h = Harness::new(ScriptedRandom::new());
    h.sink.set_failing(true);
    h.remove_footer();

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;
    assert!(h.sink.records().is_empty());
    assert!(h.store.integrity_failed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn broken_storage_never_surfaces() {
    let h = Harness::with(
        ScriptedRandom::new(),
        FakePage::new(nexar_test_utils::page(None)),
        Arc::new(FailingStore::broken()),
    );

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;

    let gate = h.watchdog.gate();
    assert!(!gate.is_app_modified());
    assert!(!gate.is_disabled("add-listing"));
    assert_eq!(h.sink.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_feature_write_does_not_stop_pass() {
    let flags = Arc::new(FailingStore::new());
    flags.fail_writes_to("__nx_disabled_add-listing");
    // n - 1 = 1, indices 0 and 0
    let h = Harness::with(
        ScriptedRandom::new().with_below([1, 0, 0]),
        FakePage::intact(),
        flags,
    );

    let pass = h.watchdog.reporter().controller().degrade();
    assert_eq!(pass.failed, vec![FeatureId::AddListing]);
    assert_eq!(pass.disabled, vec![FeatureId::EditProfile]);
}

#[tokio::test(start_paused = true)]
async fn unknown_kind_persists_code() {
    let h = Harness::new(ScriptedRandom::new().with_below([0xff]));
    h.watchdog.report(FailureKind::from_code("INVALID_LISTING_PROPS"));
    h.watchdog.settle().await;

    let snapshot = h.watchdog.status().unwrap();
    assert_eq!(snapshot.unknown_error.as_deref(), Some("ff"));
    assert!(!snapshot.integrity_failed);
}

#[tokio::test(start_paused = true)]
async fn quota_exhaustion_is_swallowed() {
    let h = Harness::with(
        ScriptedRandom::new(),
        FakePage::new(nexar_test_utils::page(None)),
        Arc::new(MemoryStore::with_quota(1)),
    );

    assert!(!h.watchdog.verify().await);
    h.watchdog.settle().await;
    assert!(h.store.integrity_failed().unwrap());
    assert!(h.store.disabled_features().unwrap().is_empty());
}

#[test]
fn rows_fixture_matches_default_keys() {
    let rows = attribution_rows();
    assert_eq!(rows[2], SettingRow::new("footer_logo_url", "Next-Soft-Logo"));
}
