//! Reap policy through the public registry surface.

use export_progress::progress::{ExportStatus, RegistrySettings, STALLED_MESSAGE};

use crate::integration::test_utils::{manual_registry, manual_registry_with};

#[test]
fn finished_export_is_reaped_after_max_age() {
    let (registry, clock) = manual_registry();
    registry.create("exp-r", None);
    registry.complete("exp-r");

    clock.advance_secs(301.0);
    registry.create("unrelated", None);

    assert!(registry.get("exp-r").is_none());
    assert!(registry.get("unrelated").is_some());
}

#[test]
fn failed_export_is_reaped_too() {
    let (registry, clock) = manual_registry();
    registry.create("exp-f", None);
    registry.fail("exp-f", "boom");
    clock.advance_secs(301.0);
    assert!(registry.get("exp-f").is_none());
}

#[test]
fn streaming_export_is_never_reaped() {
    let (registry, clock) = manual_registry();
    registry.create("exp-s", Some(10));
    for _ in 0..5 {
        clock.advance_secs(1000.0);
        assert_eq!(registry.get("exp-s").unwrap().status, ExportStatus::Streaming);
    }
}

#[test]
fn reap_is_throttled_by_interval() {
    let settings = RegistrySettings {
        reap_interval_secs: 100.0,
        max_age_secs: 10.0,
        ..RegistrySettings::default()
    };
    let (registry, clock) = manual_registry_with(settings);
    registry.create("young", None);
    registry.complete("young");

    // Old enough to expire but the interval has not passed since construction.
    clock.advance_secs(50.0);
    assert!(registry.get("young").is_some());

    clock.advance_secs(50.0);
    assert!(registry.get("young").is_none());
}

#[test]
fn terminal_entry_younger_than_max_age_survives_a_pass() {
    let (registry, clock) = manual_registry();
    clock.advance_secs(200.0);
    registry.create("recent", None);
    registry.complete("recent");
    clock.advance_secs(100.0);

    // Pass fires at t=300 but "recent" is only 100s old.
    assert!(registry.get("recent").is_some());
}

#[test]
fn stall_sweep_marks_stuck_streams_as_error() {
    let settings = RegistrySettings {
        reap_interval_secs: 10.0,
        stall_timeout_secs: Some(60.0),
        ..RegistrySettings::default()
    };
    let (registry, clock) = manual_registry_with(settings);
    registry.create("stuck", Some(100));
    registry.update("stuck", 10, 100);
    clock.advance_secs(61.0);

    let snap = registry.get("stuck").unwrap();
    assert_eq!(snap.status, ExportStatus::Error);
    assert_eq!(snap.error_message.as_deref(), Some(STALLED_MESSAGE));
    assert_eq!(snap.rows_processed, 10);

    // Now terminal, it ages out like any other finished export.
    clock.advance_secs(300.0);
    assert!(registry.get("stuck").is_none());
}

#[test]
fn registry_size_stays_bounded_under_churn() {
    let settings = RegistrySettings {
        reap_interval_secs: 1.0,
        max_age_secs: 5.0,
        ..RegistrySettings::default()
    };
    let (registry, clock) = manual_registry_with(settings);
    for i in 0..1000 {
        let id = format!("exp-{i}");
        registry.create(id.as_str(), Some(1));
        registry.update(&id, 1, 10);
        registry.complete(&id);
        clock.advance_secs(0.1);
    }
    // Only exports from the last max_age window (plus one interval) remain.
    assert!(registry.len() <= 70, "registry holds {}", registry.len());
}
