//! End-to-end lifecycle scenarios for the progress registry.

use std::time::Duration;

use export_progress::progress::{ExportStatus, ProgressRegistry};

use crate::integration::test_utils::{assert_close, manual_registry};

#[test]
fn happy_path_with_known_total() {
    let (registry, clock) = manual_registry();
    registry.create("exp-1", Some(1000));
    registry.update("exp-1", 250, 524288);
    clock.advance_secs(1.0);

    let snap = registry.get("exp-1").unwrap();
    assert_eq!(snap.status, ExportStatus::Streaming);
    assert_eq!(snap.rows_processed, 250);
    assert_eq!(snap.total_rows, Some(1000));
    assert_eq!(snap.bytes_processed, 524288);
    assert_eq!(snap.percentage, Some(25.0));
    assert_close(snap.elapsed_time, 1.0, 0.01);
    assert_close(snap.speed_rows_per_sec, 250.0, 0.01);
    assert_close(snap.speed_mb_per_sec, 0.5, 0.001);

    registry.update("exp-1", 1000, 2097152);
    registry.complete("exp-1");

    let snap = registry.get("exp-1").unwrap();
    assert_eq!(snap.status, ExportStatus::Completed);
    assert_eq!(snap.percentage, Some(100.0));
    assert_eq!(snap.rows_processed, 1000);
    assert!(snap.error_message.is_none());
}

#[test]
fn unknown_total_has_no_percentage() {
    let (registry, _clock) = manual_registry();
    registry.create("exp-2", None);
    registry.update("exp-2", 42, 1000);

    let snap = registry.get("exp-2").unwrap();
    assert_eq!(snap.percentage, None);
    assert_eq!(snap.total_rows, None);

    let json: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
    assert!(json["percentage"].is_null());
}

#[test]
fn failure_is_terminal() {
    let (registry, clock) = manual_registry();
    registry.create("exp-3", Some(10));
    registry.update("exp-3", 3, 300);
    registry.fail("exp-3", "driver closed");

    let failed = registry.get("exp-3").unwrap();
    assert_eq!(failed.status, ExportStatus::Error);
    assert_eq!(failed.error_message.as_deref(), Some("driver closed"));
    assert_eq!(failed.rows_processed, 3);

    clock.advance_secs(2.0);
    registry.update("exp-3", 9, 900);
    registry.complete("exp-3");
    registry.fail("exp-3", "second failure");

    assert_eq!(registry.get("exp-3").unwrap(), failed);
}

#[test]
fn missing_entry_is_absent() {
    let (registry, _clock) = manual_registry();
    assert!(registry.get("never-created").is_none());
}

#[test]
fn streaming_elapsed_tracks_clock_until_terminal() {
    let (registry, clock) = manual_registry();
    registry.create("exp-t", None);
    clock.advance_secs(1.5);
    assert_eq!(registry.get("exp-t").unwrap().elapsed_time, 1.5);
    clock.advance_secs(1.0);
    registry.complete("exp-t");
    clock.advance_secs(10.0);
    assert_eq!(registry.get("exp-t").unwrap().elapsed_time, 2.5);
}

#[test]
fn json_schema_matches_contract() {
    let (registry, clock) = manual_registry();
    registry.create("exp-json", Some(4));
    registry.update("exp-json", 1, 1048576);
    clock.advance_secs(2.0);
    registry.fail("exp-json", "cancelled by client");

    let value: serde_json::Value =
        serde_json::from_str(&registry.get("exp-json").unwrap().to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "export_id": "exp-json",
            "status": "error",
            "rows_processed": 1,
            "total_rows": 4,
            "bytes_processed": 1048576,
            "elapsed_time": 2.0,
            "percentage": 25.0,
            "speed_rows_per_sec": 0.5,
            "speed_mb_per_sec": 0.5,
            "error_message": "cancelled by client"
        })
    );
}

#[test]
fn monotonic_clock_registry_measures_real_time() {
    let registry = ProgressRegistry::new();
    registry.create("exp-real", Some(10));
    registry.update("exp-real", 5, 500);
    std::thread::sleep(Duration::from_millis(30));

    let snap = registry.get("exp-real").unwrap();
    assert!(snap.elapsed_time >= 0.02, "elapsed {}", snap.elapsed_time);
    assert!(snap.speed_rows_per_sec > 0.0);
    assert_eq!(snap.percentage, Some(50.0));
}
