//! Workspace config file source: config/config.toml and config/{profile}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

/// Selects the profile-specific workspace file (default: `development`).
pub const PROFILE_ENV: &str = "EXPORT_PROGRESS_ENV";

/// Add workspace config files to builder.
/// Precedence: config/config.toml (base) then config/{EXPORT_PROGRESS_ENV}.toml.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    let profile_config_path = config_dir.join(format!("{}.toml", profile));
    if profile_config_path.exists() {
        builder = builder.add_source(File::from(profile_config_path).required(false));
    }

    Ok(builder)
}
