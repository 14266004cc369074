//! Configuration System
//!
//! Layered configuration for the progress registry and logging. Sources are
//! merged lowest to highest: built-in defaults, the global config file, the
//! workspace `config/` files, then `EXPORT_PROGRESS__*` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::progress::{ProgressRegistry, RegistrySettings};
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use crate::progress::CounterPolicy;
pub use facade::ConfigLoader;
pub use sources::environment::{ENV_PREFIX, ENV_SEPARATOR};
pub use sources::global_file::{global_config_path, CONFIG_DIR_ENV};
pub use sources::workspace_file::PROFILE_ENV;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportProgressConfig {
    /// Registry tunables (reap cadence, max age, counter policy, stall sweep)
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Registry(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Registry(msg) => write!(f, "Registry: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ExportProgressConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.registry.validate() {
            errors.push(ValidationError::Registry(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Build a registry from the `[registry]` section.
    pub fn build_registry(&self) -> Result<ProgressRegistry, ApiError> {
        Ok(ProgressRegistry::with_settings(self.registry.clone())?)
    }

    pub fn to_toml(&self) -> Result<String, ApiError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
