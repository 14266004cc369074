//! CLI presentation: text and json formatters for snapshots and configuration.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;

use crate::config::ExportProgressConfig;
use crate::error::ApiError;
use crate::progress::{ExportStatus, ProgressSnapshot};

fn status_color(status: ExportStatus) -> Color {
    match status {
        ExportStatus::Streaming => Color::Yellow,
        ExportStatus::Completed => Color::Green,
        ExportStatus::Error => Color::Red,
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Render polled snapshots as a table followed by a one-line summary.
pub fn format_snapshots_text(samples: &[ProgressSnapshot], color: bool) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "elapsed (s)",
        "status",
        "rows",
        "total",
        "bytes",
        "%",
        "rows/s",
        "MB/s",
    ]);

    for snap in samples {
        let status = if color {
            Cell::new(snap.status.as_str()).fg(status_color(snap.status))
        } else {
            Cell::new(snap.status.as_str())
        };
        table.add_row(vec![
            Cell::new(format!("{:.2}", snap.elapsed_time)),
            status,
            Cell::new(snap.rows_processed),
            Cell::new(optional(snap.total_rows)),
            Cell::new(snap.bytes_processed),
            Cell::new(optional(snap.percentage.map(|p| format!("{:.1}", p)))),
            Cell::new(format!("{:.2}", snap.speed_rows_per_sec)),
            Cell::new(format!("{:.3}", snap.speed_mb_per_sec)),
        ]);
    }

    let mut out = table.to_string();
    if let Some(last) = samples.last() {
        out.push('\n');
        out.push_str(&format_summary_line(last, color));
    }
    out
}

/// One-line outcome summary for the final snapshot.
pub fn format_summary_line(snap: &ProgressSnapshot, color: bool) -> String {
    let line = match snap.status {
        ExportStatus::Error => format!(
            "export {} failed after {:.2}s: {}",
            snap.export_id,
            snap.elapsed_time,
            snap.error_message.as_deref().unwrap_or("unknown error")
        ),
        status => format!(
            "export {} {} after {:.2}s ({} rows, {} bytes)",
            snap.export_id, status, snap.elapsed_time, snap.rows_processed, snap.bytes_processed
        ),
    };
    if !color {
        return line;
    }
    match snap.status {
        ExportStatus::Completed => line.green().to_string(),
        ExportStatus::Error => line.red().to_string(),
        ExportStatus::Streaming => line.yellow().to_string(),
    }
}

/// Render polled snapshots as JSON lines (one snapshot per line).
pub fn format_snapshots_json(samples: &[ProgressSnapshot]) -> Result<String, ApiError> {
    let lines = samples
        .iter()
        .map(|s| s.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

pub fn format_config_toml(config: &ExportProgressConfig) -> Result<String, ApiError> {
    config.to_toml()
}

pub fn format_config_json(config: &ExportProgressConfig) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(config)?)
}
