//! Error types for the export progress tracker.
//!
//! The registry operations themselves are infallible; these cover the
//! surrounding surfaces (global installation, settings, configuration, logging).

use thiserror::Error;

/// Progress-registry errors
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Global progress registry is already initialized")]
    GlobalAlreadyInitialized,

    #[error("Invalid registry settings: {0}")]
    InvalidSettings(String),
}

/// Crate-level errors surfaced to binaries and embedding applications
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for ApiError {
    fn from(err: toml::ser::Error) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
