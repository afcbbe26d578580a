//! Output formatting for CLI commands
//!
//! Run summaries and mount listings can be printed as JSON, YAML or a plain table. Only
//! parameter names and counts are ever printed, never secret values.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::migration::{MountStatus, RunSummary};
use crate::source::Mount;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

pub fn print_run_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Yaml => print_yaml(summary),
        OutputFormat::Table => {
            print!("{}", render_summary_table(summary));
            Ok(())
        }
    }
}

pub fn print_mounts(mounts: &[Mount], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&mounts),
        OutputFormat::Yaml => print_yaml(&mounts),
        OutputFormat::Table => {
            print!("{}", render_mounts_table(mounts));
            Ok(())
        }
    }
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn table_header(out: &mut String, columns: &[(&str, usize)]) {
    let mut header = String::new();
    for (name, width) in columns {
        let _ = write!(header, "{:<width$} ", name, width = width);
    }
    let _ = writeln!(out, "{}", header.trim_end());

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    let _ = writeln!(out, "{}", "-".repeat(total_width.saturating_sub(1)));
}

pub fn render_mounts_table(mounts: &[Mount]) -> String {
    let mut out = String::new();
    table_header(&mut out, &[("Mount", 40), ("Variant", 8)]);
    for mount in mounts {
        let _ = writeln!(out, "{:<40} {}", truncate(&mount.id, 40), mount.version);
    }
    out
}

pub fn render_summary_table(summary: &RunSummary) -> String {
    let mut out = String::new();

    let mode = if summary.dry_run { " (dry run)" } else { "" };
    let _ = writeln!(out, "Run {}{}", summary.run_id, mode);
    let elapsed = summary.finished_at - summary.started_at;
    let _ = writeln!(out, "Finished in {} ms", elapsed.num_milliseconds());
    let _ = writeln!(out);

    table_header(&mut out, &[("Mount", 30), ("Variant", 8), ("Status", 10), ("Entries", 8)]);
    for report in &summary.mounts {
        let status = match report.status {
            MountStatus::Succeeded => "succeeded",
            MountStatus::Failed { .. } => "failed",
        };
        let _ = writeln!(
            out,
            "{:<30} {:<8} {:<10} {}",
            truncate(&report.mount, 30),
            report.version,
            status,
            report.entries
        );
    }
    for report in &summary.mounts {
        if let MountStatus::Failed { ref error } = report.status {
            let _ = writeln!(out, "  {}: {}", report.mount, error);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Entries collected:  {}", summary.entries_collected);
    let _ = writeln!(out, "Writes attempted:   {}", summary.publish.attempted);
    let _ = writeln!(out, "Writes succeeded:   {}", summary.publish.succeeded);
    let _ = writeln!(out, "Writes failed:      {}", summary.publish.failed.len());
    for failure in &summary.publish.failed {
        let _ = writeln!(out, "  {}: {}", failure.name, failure.error);
    }

    out
}
