//! CLI parse: clap types for the export-progress demo binary. Definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Export progress tracker - simulate streaming exports and inspect configuration
#[derive(Parser, Debug)]
#[command(name = "export-progress")]
#[command(about = "In-process progress tracking for streaming exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (searched for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a synthetic streaming export and poll its progress
    Simulate {
        /// Export identifier
        #[arg(long, default_value = "sim-export")]
        export_id: String,
        /// Total rows the producer emits
        #[arg(long, default_value = "10000")]
        rows: u64,
        /// Rows per flushed chunk
        #[arg(long, default_value = "500")]
        chunk_rows: u64,
        /// Bytes per row
        #[arg(long, default_value = "128")]
        row_bytes: u64,
        /// Delay between chunks in milliseconds
        #[arg(long, default_value = "10")]
        chunk_delay_ms: u64,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "50")]
        poll_ms: u64,
        /// Do not announce the total row count up front
        #[arg(long)]
        unknown_total: bool,
        /// Fail the export once this many rows have been emitted
        #[arg(long)]
        fail_at: Option<u64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the effective configuration
    Config {
        /// Output format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}
