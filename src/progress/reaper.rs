//! Reap policy: throttled, inline purge of terminal entries.

use std::collections::HashMap;
use std::time::Duration;

use crate::progress::entry::ProgressEntry;

/// Message stored on entries reclassified by the stall sweep.
pub const STALLED_MESSAGE: &str = "stalled";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReapPolicy {
    /// Minimum time between two reap passes.
    pub reap_interval: Duration,
    /// Terminal entries older than this (measured from creation) are dropped.
    pub max_age: Duration,
    /// Streaming entries older than this are failed with [`STALLED_MESSAGE`].
    pub stall_timeout: Option<Duration>,
}

impl Default for ReapPolicy {
    fn default() -> Self {
        Self {
            reap_interval: Duration::from_secs(300),
            max_age: Duration::from_secs(300),
            stall_timeout: None,
        }
    }
}

/// Outcome of one reap pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub removed: Vec<String>,
    pub stalled: Vec<String>,
}

impl ReapReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.stalled.is_empty()
    }
}

/// Reaper state. Has no thread; the registry drives it under its lock.
#[derive(Debug, Clone)]
pub struct Reaper {
    policy: ReapPolicy,
    last_reap_at: Duration,
}

impl Reaper {
    pub fn new(policy: ReapPolicy, now: Duration) -> Self {
        Self {
            policy,
            last_reap_at: now,
        }
    }

    pub fn policy(&self) -> &ReapPolicy {
        &self.policy
    }

    pub fn last_reap_at(&self) -> Duration {
        self.last_reap_at
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now.saturating_sub(self.last_reap_at) >= self.policy.reap_interval
    }

    /// Run a pass only if the throttle window has passed.
    pub fn maybe_reap(
        &mut self,
        entries: &mut HashMap<String, ProgressEntry>,
        now: Duration,
    ) -> Option<ReapReport> {
        if !self.is_due(now) {
            return None;
        }
        Some(self.reap(entries, now))
    }

    /// Run a pass unconditionally.
    pub fn reap(
        &mut self,
        entries: &mut HashMap<String, ProgressEntry>,
        now: Duration,
    ) -> ReapReport {
        let max_age = self.policy.max_age;
        let mut removed = Vec::new();
        entries.retain(|export_id, entry| {
            let expired = entry.is_terminal() && entry.age_at(now) > max_age;
            if expired {
                removed.push(export_id.clone());
            }
            !expired
        });

        // Runs after the age purge so a freshly stalled entry stays visible
        // for at least one more window.
        let mut stalled = Vec::new();
        if let Some(timeout) = self.policy.stall_timeout {
            for (export_id, entry) in entries.iter_mut() {
                if !entry.is_terminal()
                    && entry.elapsed_at(now) > timeout
                    && entry.mark_failed(STALLED_MESSAGE, now)
                {
                    stalled.push(export_id.clone());
                }
            }
        }

        removed.sort();
        stalled.sort();
        self.last_reap_at = now;
        ReapReport { removed, stalled }
    }
}
