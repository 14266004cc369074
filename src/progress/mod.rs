//! Streaming export progress primitives.

pub mod clock;
pub mod entry;
pub mod reaper;
pub mod registry;
pub mod tracker;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use entry::{
    percentage,
    round_to,
    CounterPolicy,
    ExportStatus,
    ProgressEntry,
    ProgressSnapshot,
    BYTES_PER_MB,
};
pub use reaper::{ReapPolicy, ReapReport, Reaper, STALLED_MESSAGE};
pub use registry::{ProgressRegistry, RegistrySettings};
pub use tracker::{ExportTracker, ABORTED_MESSAGE, DEFAULT_PUBLISH_INTERVAL};
