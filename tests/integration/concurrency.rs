//! Concurrent producers and pollers on a shared registry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use export_progress::progress::{ExportStatus, ProgressRegistry};

const READERS: usize = 8;
const WRITERS: usize = 8;

#[test]
fn pollers_never_observe_torn_snapshots() {
    const UPDATES: u64 = 1_000_000;
    let registry = ProgressRegistry::new();
    registry.create("exp-c", Some(UPDATES));
    let producer_done = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..READERS {
            scope.spawn(|| {
                let mut last_rows = 0;
                while !producer_done.load(Ordering::Acquire) {
                    let snap = registry.get("exp-c").expect("entry exists while streaming");
                    assert_eq!(snap.rows_processed * 100, snap.bytes_processed);
                    assert!(snap.rows_processed >= last_rows, "single producer is monotonic");
                    last_rows = snap.rows_processed;
                }
            });
        }

        scope.spawn(|| {
            for i in 1..=UPDATES {
                registry.update("exp-c", i, i * 100);
            }
            producer_done.store(true, Ordering::Release);
        });
    });

    let snap = registry.get("exp-c").unwrap();
    assert_eq!(snap.rows_processed, UPDATES);
    assert_eq!(snap.bytes_processed, UPDATES * 100);
    assert_eq!(snap.percentage, Some(100.0));
}

#[test]
fn many_writers_and_readers_stay_consistent() {
    const PER_WRITER: u64 = 20_000;
    let registry = ProgressRegistry::new();
    registry.create("exp-m", None);
    let writers_done = AtomicU64::new(0);

    thread::scope(|scope| {
        for w in 0..WRITERS as u64 {
            let registry = &registry;
            let writers_done = &writers_done;
            scope.spawn(move || {
                for i in 0..PER_WRITER {
                    // Each writer owns a disjoint residue class of row values.
                    let rows = i * WRITERS as u64 + w;
                    registry.update("exp-m", rows, rows * 100);
                }
                writers_done.fetch_add(1, Ordering::Release);
            });
        }

        for _ in 0..READERS {
            scope.spawn(|| {
                while writers_done.load(Ordering::Acquire) < WRITERS as u64 {
                    let snap = registry.get("exp-m").unwrap();
                    assert_eq!(snap.rows_processed * 100, snap.bytes_processed);
                    assert!(snap.rows_processed < PER_WRITER * WRITERS as u64);
                }
            });
        }
    });

    // Whatever interleaving happened, the last write in mutex order wins.
    registry.update("exp-m", 7, 700);
    let snap = registry.get("exp-m").unwrap();
    assert_eq!(snap.rows_processed, 7);
    assert_eq!(snap.bytes_processed, 700);
}

#[test]
fn independent_exports_progress_in_parallel() {
    let registry = ProgressRegistry::new();
    thread::scope(|scope| {
        for t in 0..8u64 {
            let registry = &registry;
            scope.spawn(move || {
                let id = format!("exp-{t}");
                registry.create(id.as_str(), Some(1000));
                for i in 1..=1000 {
                    registry.update(&id, i, i * (t + 1));
                }
                registry.complete(&id);
            });
        }
    });

    assert_eq!(registry.len(), 8);
    for snap in registry.snapshots() {
        assert_eq!(snap.status, ExportStatus::Completed);
        assert_eq!(snap.rows_processed, 1000);
    }
}

#[test]
fn terminal_transition_races_resolve_to_one_winner() {
    for round in 0..50 {
        let registry = ProgressRegistry::new();
        let id = format!("race-{round}");
        registry.create(id.as_str(), None);
        thread::scope(|scope| {
            scope.spawn(|| registry.complete(&id));
            scope.spawn(|| registry.fail(&id, "lost the race"));
        });
        let snap = registry.get(&id).unwrap();
        match snap.status {
            ExportStatus::Completed => assert!(snap.error_message.is_none()),
            ExportStatus::Error => {
                assert_eq!(snap.error_message.as_deref(), Some("lost the race"))
            }
            ExportStatus::Streaming => panic!("transition lost"),
        }
    }
}
