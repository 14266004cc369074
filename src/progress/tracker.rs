//! Producer-side handle for one streaming export.
//!
//! Accumulates chunk counters locally and publishes them to the registry at a
//! bounded rate. Dropping the handle without `complete` or `fail` marks the
//! export as failed, which covers a producer that unwinds mid-stream.

use std::time::Duration;

use crate::progress::registry::ProgressRegistry;

/// Error message recorded when a tracker is dropped before finishing.
pub const ABORTED_MESSAGE: &str = "export aborted before completion";

/// Default minimum time between two published updates.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct ExportTracker<'a> {
    registry: &'a ProgressRegistry,
    export_id: String,
    rows_processed: u64,
    bytes_processed: u64,
    publish_interval: Duration,
    last_publish: Option<Duration>,
    dirty: bool,
    finished: bool,
}

impl ProgressRegistry {
    /// Create the entry for `export_id` and return a producer handle for it.
    pub fn track(&self, export_id: impl Into<String>, total_rows: Option<u64>) -> ExportTracker<'_> {
        let export_id = export_id.into();
        self.create(export_id.clone(), total_rows);
        ExportTracker {
            registry: self,
            export_id,
            rows_processed: 0,
            bytes_processed: 0,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            last_publish: None,
            dirty: false,
            finished: false,
        }
    }
}

impl<'a> ExportTracker<'a> {
    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        self.publish_interval = interval;
        self
    }

    pub fn export_id(&self) -> &str {
        &self.export_id
    }

    pub fn rows_processed(&self) -> u64 {
        self.rows_processed
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Account for one flushed chunk; publishes if the interval has passed.
    pub fn record_chunk(&mut self, rows: u64, bytes: u64) {
        self.rows_processed = self.rows_processed.saturating_add(rows);
        self.bytes_processed = self.bytes_processed.saturating_add(bytes);
        self.dirty = true;

        let now = self.registry.now();
        let due = match self.last_publish {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.publish_interval,
        };
        if due {
            self.publish(now);
        }
    }

    /// Publish the accumulated counters regardless of the interval.
    pub fn flush(&mut self) {
        if self.dirty {
            let now = self.registry.now();
            self.publish(now);
        }
    }

    pub fn complete(mut self) {
        self.flush();
        self.registry.complete(&self.export_id);
        self.finished = true;
    }

    pub fn fail(mut self, error_message: &str) {
        self.flush();
        self.registry.fail(&self.export_id, error_message);
        self.finished = true;
    }

    fn publish(&mut self, now: Duration) {
        self.registry
            .update(&self.export_id, self.rows_processed, self.bytes_processed);
        self.last_publish = Some(now);
        self.dirty = false;
    }
}

impl Drop for ExportTracker<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.flush();
        self.registry.fail(&self.export_id, ABORTED_MESSAGE);
    }
}
