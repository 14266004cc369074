//! Per-export progress state and the snapshots rendered from it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bytes in one binary megabyte.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Streaming,
    Completed,
    Error,
}

impl ExportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Streaming => "streaming",
            ExportStatus::Completed => "completed",
            ExportStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ExportStatus::Streaming)
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an `update` that would decrease a counter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPolicy {
    /// The caller's value is authoritative and replaces the stored one.
    #[default]
    Accept,
    /// Counters keep their previous maximum.
    Clamp,
}

/// Immutable, detached view of one export's progress.
///
/// Every field is always serialized; unknown optionals render as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub export_id: String,
    pub status: ExportStatus,
    pub rows_processed: u64,
    pub total_rows: Option<u64>,
    pub bytes_processed: u64,
    pub elapsed_time: f64,
    pub percentage: Option<f64>,
    pub speed_rows_per_sec: f64,
    pub speed_mb_per_sec: f64,
    pub error_message: Option<String>,
}

impl ProgressSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// What an accepted `update` looked like relative to the previous state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct UpdateOutcome {
    pub regressed: bool,
    pub exceeds_total: bool,
    pub previous_rows: u64,
    pub previous_bytes: u64,
}

/// Progress state for one export. Only mutated under the registry lock.
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    export_id: String,
    status: ExportStatus,
    rows_processed: u64,
    total_rows: Option<u64>,
    bytes_processed: u64,
    start_time: Duration,
    elapsed_time: Duration,
    error_message: Option<String>,
}

impl ProgressEntry {
    pub fn new(export_id: impl Into<String>, total_rows: Option<u64>, now: Duration) -> Self {
        Self {
            export_id: export_id.into(),
            status: ExportStatus::Streaming,
            rows_processed: 0,
            total_rows,
            bytes_processed: 0,
            start_time: now,
            elapsed_time: Duration::ZERO,
            error_message: None,
        }
    }

    pub fn export_id(&self) -> &str {
        &self.export_id
    }

    pub fn status(&self) -> ExportStatus {
        self.status
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Elapsed time as of `now`; frozen once the entry is terminal.
    pub fn elapsed_at(&self, now: Duration) -> Duration {
        if self.is_terminal() {
            self.elapsed_time
        } else {
            now.saturating_sub(self.start_time)
        }
    }

    /// Age measured from creation, used by the reaper.
    pub fn age_at(&self, now: Duration) -> Duration {
        now.saturating_sub(self.start_time)
    }

    /// Replace the counters. Returns `None` when the entry is terminal.
    pub(crate) fn apply_update(
        &mut self,
        rows_processed: u64,
        bytes_processed: u64,
        now: Duration,
        policy: CounterPolicy,
    ) -> Option<UpdateOutcome> {
        if self.is_terminal() {
            return None;
        }

        let previous_rows = self.rows_processed;
        let previous_bytes = self.bytes_processed;
        let regressed = rows_processed < previous_rows || bytes_processed < previous_bytes;

        match policy {
            CounterPolicy::Accept => {
                self.rows_processed = rows_processed;
                self.bytes_processed = bytes_processed;
            }
            CounterPolicy::Clamp => {
                self.rows_processed = rows_processed.max(previous_rows);
                self.bytes_processed = bytes_processed.max(previous_bytes);
            }
        }
        self.elapsed_time = now.saturating_sub(self.start_time);

        let exceeds_total = self
            .total_rows
            .is_some_and(|total| self.rows_processed > total);

        Some(UpdateOutcome {
            regressed,
            exceeds_total,
            previous_rows,
            previous_bytes,
        })
    }

    /// `streaming -> completed`. Returns false if the entry was already terminal.
    pub(crate) fn mark_completed(&mut self, now: Duration) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.elapsed_time = now.saturating_sub(self.start_time);
        self.status = ExportStatus::Completed;
        true
    }

    /// `streaming -> error`. Returns false if the entry was already terminal.
    pub(crate) fn mark_failed(&mut self, message: impl Into<String>, now: Duration) -> bool {
        if self.is_terminal() {
            return false;
        }
        let mut message = message.into();
        if message.is_empty() {
            message = "unknown error".to_string();
        }
        self.elapsed_time = now.saturating_sub(self.start_time);
        self.status = ExportStatus::Error;
        self.error_message = Some(message);
        true
    }

    pub fn snapshot(&self, now: Duration) -> ProgressSnapshot {
        let elapsed = self.elapsed_at(now).as_secs_f64();
        let (speed_rows, speed_mb) = if elapsed > 0.0 {
            (
                self.rows_processed as f64 / elapsed,
                self.bytes_processed as f64 / elapsed / BYTES_PER_MB,
            )
        } else {
            (0.0, 0.0)
        };

        ProgressSnapshot {
            export_id: self.export_id.clone(),
            status: self.status,
            rows_processed: self.rows_processed,
            total_rows: self.total_rows,
            bytes_processed: self.bytes_processed,
            elapsed_time: round_to(elapsed, 2),
            percentage: percentage(self.rows_processed, self.total_rows),
            speed_rows_per_sec: round_to(speed_rows, 2),
            speed_mb_per_sec: round_to(speed_mb, 3),
            error_message: self.error_message.clone(),
        }
    }
}

/// Completion percentage in `[0, 100]`, or `None` when the total is unknown or zero.
pub fn percentage(rows_processed: u64, total_rows: Option<u64>) -> Option<f64> {
    match total_rows {
        Some(total) if total > 0 => {
            let pct = 100.0 * rows_processed as f64 / total as f64;
            Some(round_to(pct.min(100.0), 1))
        }
        _ => None,
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
