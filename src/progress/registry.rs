//! Process-wide export progress registry.
//!
//! One mutex guards the entry map, the reaper state and every entry field, so
//! each public operation is atomic with respect to all others and snapshots
//! are never torn. Operations never fail: unknown IDs and mutations of
//! terminal entries resolve to no-ops with diagnostic logging, emitted after
//! the lock is released.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ProgressError;
use crate::progress::clock::{Clock, MonotonicClock};
use crate::progress::entry::{CounterPolicy, ProgressEntry, ProgressSnapshot, UpdateOutcome};
use crate::progress::reaper::{ReapPolicy, ReapReport, Reaper};

static GLOBAL: OnceCell<ProgressRegistry> = OnceCell::new();

/// Tunables for a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Minimum seconds between reap passes
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: f64,

    /// Seconds after creation before a terminal entry may be reaped
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: f64,

    /// Handling of updates that would decrease a counter
    #[serde(default)]
    pub counter_policy: CounterPolicy,

    /// Streaming entries older than this are failed as stalled (disabled if unset)
    #[serde(default)]
    pub stall_timeout_secs: Option<f64>,
}

fn default_reap_interval_secs() -> f64 {
    300.0
}

fn default_max_age_secs() -> f64 {
    300.0
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            reap_interval_secs: default_reap_interval_secs(),
            max_age_secs: default_max_age_secs(),
            counter_policy: CounterPolicy::default(),
            stall_timeout_secs: None,
        }
    }
}

impl RegistrySettings {
    pub fn validate(&self) -> Result<(), String> {
        self.reap_policy().map(|_| ()).map_err(|e| e.to_string())
    }

    pub fn reap_policy(&self) -> Result<ReapPolicy, ProgressError> {
        let stall_timeout = match self.stall_timeout_secs {
            Some(secs) if secs <= 0.0 => {
                return Err(ProgressError::InvalidSettings(format!(
                    "stall_timeout_secs must be positive, got {secs}"
                )))
            }
            Some(secs) => Some(to_duration("stall_timeout_secs", secs)?),
            None => None,
        };
        Ok(ReapPolicy {
            reap_interval: to_duration("reap_interval_secs", self.reap_interval_secs)?,
            max_age: to_duration("max_age_secs", self.max_age_secs)?,
            stall_timeout,
        })
    }
}

fn to_duration(field: &str, secs: f64) -> Result<Duration, ProgressError> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        ProgressError::InvalidSettings(format!(
            "{field} must be a finite, non-negative number of seconds, got {secs}"
        ))
    })
}

struct RegistryState {
    entries: HashMap<String, ProgressEntry>,
    reaper: Reaper,
}

/// Result of addressing one entry under the lock.
enum Lookup<T> {
    Missing,
    Terminal,
    Applied(T),
}

pub struct ProgressRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
    settings: RegistrySettings,
    counter_policy: CounterPolicy,
}

impl std::fmt::Debug for ProgressRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressRegistry")
            .field("settings", &self.settings)
            .field("entries", &self.len())
            .finish()
    }
}

impl Default for ProgressRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressRegistry {
    /// Registry with default settings on the platform monotonic clock.
    pub fn new() -> Self {
        Self::build(
            RegistrySettings::default(),
            ReapPolicy::default(),
            Arc::new(MonotonicClock::new()),
        )
    }

    pub fn with_settings(settings: RegistrySettings) -> Result<Self, ProgressError> {
        Self::with_clock(settings, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        settings: RegistrySettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProgressError> {
        let policy = settings.reap_policy()?;
        Ok(Self::build(settings, policy, clock))
    }

    fn build(settings: RegistrySettings, policy: ReapPolicy, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            state: Mutex::new(RegistryState {
                entries: HashMap::new(),
                reaper: Reaper::new(policy, now),
            }),
            counter_policy: settings.counter_policy,
            settings,
            clock,
        }
    }

    /// The process-wide registry, constructed with defaults on first use.
    pub fn global() -> &'static ProgressRegistry {
        GLOBAL.get_or_init(ProgressRegistry::new)
    }

    /// Install a configured registry as the process-wide instance.
    ///
    /// Fails if `global()` or a previous install already initialized it.
    pub fn install_global(
        registry: ProgressRegistry,
    ) -> Result<&'static ProgressRegistry, ProgressError> {
        let mut candidate = Some(registry);
        let installed =
            GLOBAL.get_or_init(|| candidate.take().unwrap_or_else(ProgressRegistry::new));
        match candidate {
            None => Ok(installed),
            Some(_) => Err(ProgressError::GlobalAlreadyInitialized),
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Current reading of the registry's clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Install a fresh streaming entry, replacing any entry with the same ID.
    pub fn create(&self, export_id: impl Into<String>, total_rows: Option<u64>) {
        let export_id = export_id.into();
        let (replaced, report) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let RegistryState { entries, reaper } = &mut *state;
            let report = reaper.maybe_reap(entries, now);
            let entry = ProgressEntry::new(export_id.clone(), total_rows, now);
            let replaced = entries.insert(export_id.clone(), entry).is_some();
            (replaced, report)
        };
        log_reap(report);

        if replaced {
            debug!(export_id = %export_id, "replaced existing export progress entry");
        }
        debug!(export_id = %export_id, total_rows = ?total_rows, "export progress created");
    }

    /// Replace the counters of a streaming entry.
    pub fn update(&self, export_id: &str, rows_processed: u64, bytes_processed: u64) {
        let policy = self.counter_policy;
        let result = self.with_entry(export_id, |entry, now| {
            entry.apply_update(rows_processed, bytes_processed, now, policy)
        });

        match result {
            Lookup::Missing => {
                warn!(export_id = %export_id, "progress update for unknown export ignored");
            }
            Lookup::Terminal => {
                debug!(export_id = %export_id, "progress update for finished export ignored");
            }
            Lookup::Applied(outcome) => {
                log_update(export_id, rows_processed, bytes_processed, outcome)
            }
        }
    }

    /// Transition a streaming entry to `completed`.
    pub fn complete(&self, export_id: &str) {
        let result = self.with_entry(export_id, |entry, now| {
            entry.mark_completed(now).then(|| entry.elapsed_at(now))
        });

        match result {
            Lookup::Missing => {
                warn!(export_id = %export_id, "completion for unknown export ignored");
            }
            Lookup::Terminal => {
                debug!(export_id = %export_id, "completion for finished export ignored");
            }
            Lookup::Applied(elapsed) => {
                debug!(
                    export_id = %export_id,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "export completed"
                );
            }
        }
    }

    /// Transition a streaming entry to `error` with `error_message`.
    pub fn fail(&self, export_id: &str, error_message: &str) {
        let result = self.with_entry(export_id, |entry, now| {
            entry.mark_failed(error_message, now).then_some(())
        });

        match result {
            Lookup::Missing => {
                warn!(export_id = %export_id, "failure for unknown export ignored");
            }
            Lookup::Terminal => {
                debug!(export_id = %export_id, "failure for finished export ignored");
            }
            Lookup::Applied(()) => {
                debug!(export_id = %export_id, error = %error_message, "export failed");
            }
        }
    }

    /// Detached snapshot of one export, or `None` if it is unknown or reaped.
    pub fn get(&self, export_id: &str) -> Option<ProgressSnapshot> {
        let (snapshot, report) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let RegistryState { entries, reaper } = &mut *state;
            let report = reaper.maybe_reap(entries, now);
            let snapshot = entries.get(export_id).map(|e| e.snapshot(now));
            (snapshot, report)
        };
        log_reap(report);
        snapshot
    }

    /// Snapshots of every tracked export, ordered by export ID.
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        let (mut snapshots, report) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let RegistryState { entries, reaper } = &mut *state;
            let report = reaper.maybe_reap(entries, now);
            let snapshots: Vec<ProgressSnapshot> =
                entries.values().map(|e| e.snapshot(now)).collect();
            (snapshots, report)
        };
        log_reap(report);
        snapshots.sort_by(|a, b| a.export_id.cmp(&b.export_id));
        snapshots
    }

    pub fn contains(&self, export_id: &str) -> bool {
        self.state.lock().entries.contains_key(export_id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop one entry regardless of its state.
    pub fn remove(&self, export_id: &str) -> Option<ProgressSnapshot> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.entries.remove(export_id).map(|e| e.snapshot(now))
    }

    /// Drop every entry and restart the reap window.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.entries.clear();
        state.reaper = Reaper::new(*state.reaper.policy(), now);
    }

    /// Run a reap pass now, ignoring the throttle.
    pub fn reap_now(&self) -> ReapReport {
        let report = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let RegistryState { entries, reaper } = &mut *state;
            reaper.reap(entries, now)
        };
        log_reap(Some(report.clone()));
        report
    }

    fn with_entry<T>(
        &self,
        export_id: &str,
        f: impl FnOnce(&mut ProgressEntry, Duration) -> Option<T>,
    ) -> Lookup<T> {
        let (result, report) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let RegistryState { entries, reaper } = &mut *state;
            let report = reaper.maybe_reap(entries, now);
            let result = match entries.get_mut(export_id) {
                None => Lookup::Missing,
                Some(entry) => match f(entry, now) {
                    None => Lookup::Terminal,
                    Some(value) => Lookup::Applied(value),
                },
            };
            (result, report)
        };
        log_reap(report);
        result
    }
}

fn log_update(export_id: &str, rows: u64, bytes: u64, outcome: UpdateOutcome) {
    if outcome.regressed {
        warn!(
            export_id = %export_id,
            rows_processed = rows,
            bytes_processed = bytes,
            previous_rows = outcome.previous_rows,
            previous_bytes = outcome.previous_bytes,
            "progress counters moved backward"
        );
    }
    if outcome.exceeds_total {
        warn!(
            export_id = %export_id,
            rows_processed = rows,
            "rows processed exceed declared total"
        );
    }
}

fn log_reap(report: Option<ReapReport>) {
    let Some(report) = report else {
        return;
    };
    if !report.removed.is_empty() {
        info!(removed = report.removed.len(), "reaped finished export progress entries");
    }
    for export_id in &report.stalled {
        warn!(export_id = %export_id, "export progress stalled; marked as error");
    }
}
