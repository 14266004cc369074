//! Export Progress: streaming export progress tracking
//!
//! A process-wide registry that lets a streaming export producer publish
//! incremental progress while any number of pollers read consistent snapshots.
//! Finished exports are reaped after a configurable age so long-running
//! processes stay bounded.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;

pub use progress::{
    ExportStatus, ExportTracker, ProgressRegistry, ProgressSnapshot, RegistrySettings,
};
