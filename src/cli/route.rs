//! CLI route: run context and command dispatch.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::cli::parse::{Commands, ConfigFormat, OutputFormat};
use crate::cli::presentation::{
    format_config_json, format_config_toml, format_snapshots_json, format_snapshots_text,
};
use crate::config::{ConfigLoader, ExportProgressConfig};
use crate::error::ApiError;
use crate::progress::{ProgressRegistry, ProgressSnapshot};

/// Parameters for one synthetic export run.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub export_id: String,
    pub rows: u64,
    pub chunk_rows: u64,
    pub row_bytes: u64,
    pub chunk_delay: Duration,
    pub poll_interval: Duration,
    pub announce_total: bool,
    pub fail_at: Option<u64>,
}

/// Runtime context for CLI execution: workspace, loaded config, and the registry.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ExportProgressConfig,
    registry: ProgressRegistry,
    color: bool,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    pub fn from_config(
        workspace_root: PathBuf,
        config: ExportProgressConfig,
    ) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let registry = config.build_registry()?;
        let color = config.logging.color;
        Ok(Self {
            workspace_root,
            config,
            registry,
            color,
        })
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    pub fn config(&self) -> &ExportProgressConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProgressRegistry {
        &self.registry
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Simulate {
                export_id,
                rows,
                chunk_rows,
                row_bytes,
                chunk_delay_ms,
                poll_ms,
                unknown_total,
                fail_at,
                format,
            } => {
                let request = SimulationRequest {
                    export_id: export_id.clone(),
                    rows: *rows,
                    chunk_rows: *chunk_rows,
                    row_bytes: *row_bytes,
                    chunk_delay: Duration::from_millis(*chunk_delay_ms),
                    poll_interval: Duration::from_millis(*poll_ms),
                    announce_total: !*unknown_total,
                    fail_at: *fail_at,
                };
                let samples = self.simulate(&request)?;
                match format {
                    OutputFormat::Text => Ok(format_snapshots_text(&samples, self.color)),
                    OutputFormat::Json => format_snapshots_json(&samples),
                }
            }
            Commands::Config { format } => match format {
                ConfigFormat::Toml => format_config_toml(&self.config),
                ConfigFormat::Json => format_config_json(&self.config),
            },
        }
    }

    /// Stream a synthetic export on a producer thread while this thread polls.
    ///
    /// Returns every snapshot observed, ending with the terminal one.
    pub fn simulate(&self, request: &SimulationRequest) -> Result<Vec<ProgressSnapshot>, ApiError> {
        if request.chunk_rows == 0 {
            return Err(ApiError::ConfigError("chunk_rows must be positive".to_string()));
        }
        if request
            .chunk_rows
            .min(request.rows)
            .checked_mul(request.row_bytes)
            .is_none()
        {
            return Err(ApiError::ConfigError(format!(
                "chunk of {} rows at {} bytes per row overflows the byte counter",
                request.chunk_rows.min(request.rows),
                request.row_bytes
            )));
        }
        let registry = &self.registry;
        let total = request.announce_total.then_some(request.rows);
        info!(export_id = %request.export_id, rows = request.rows, "starting simulated export");

        // Created before the producer starts so the first poll never misses it.
        let tracker = registry.track(request.export_id.clone(), total);

        let samples = thread::scope(|scope| {
            scope.spawn(move || {
                let mut tracker = tracker.with_publish_interval(request.poll_interval / 2);
                let mut emitted = 0u64;
                while emitted < request.rows {
                    thread::sleep(request.chunk_delay);
                    let chunk = request.chunk_rows.min(request.rows - emitted);
                    emitted += chunk;
                    tracker.record_chunk(chunk, chunk.saturating_mul(request.row_bytes));
                    if request.fail_at.is_some_and(|limit| emitted >= limit) {
                        tracker.fail("simulated failure");
                        return;
                    }
                }
                tracker.complete();
            });

            let mut samples = Vec::new();
            loop {
                thread::sleep(request.poll_interval);
                let Some(snapshot) = registry.get(&request.export_id) else {
                    break;
                };
                debug!(
                    export_id = %snapshot.export_id,
                    rows_processed = snapshot.rows_processed,
                    "polled export progress"
                );
                let done = snapshot.is_terminal();
                samples.push(snapshot);
                if done {
                    break;
                }
            }
            samples
        });

        // A terminal entry can be reaped before the next poll under aggressive settings.
        if !samples.last().is_some_and(ProgressSnapshot::is_terminal) {
            return Err(ApiError::ConfigError(format!(
                "export {} was reaped before a terminal snapshot was observed; \
                 raise registry.max_age_secs",
                request.export_id
            )));
        }
        Ok(samples)
    }
}
