//! Config loader: assembles sources in merge order and deserializes the result.

use std::path::Path;

use config::File;
use tracing::debug;

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::ExportProgressConfig;
use crate::error::ApiError;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root` from every layered source.
    pub fn load(workspace_root: &Path) -> Result<ExportProgressConfig, ApiError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: ExportProgressConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<ExportProgressConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config: ExportProgressConfig = builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}
