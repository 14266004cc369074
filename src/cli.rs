//! CLI domain: parse, route, output, and presentation only.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigFormat, OutputFormat};
pub use presentation::{
    format_config_json, format_config_toml, format_snapshots_json, format_snapshots_text,
    format_summary_line,
};
pub use route::{RunContext, SimulationRequest};
