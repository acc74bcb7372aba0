//! `sprintlog track`: rebuild sprint timelines and write the bucketed report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use sprintlog_core::aggregate::{Aggregate, Granularity};
use sprintlog_core::report::ReportEmitter;
use sprintlog_core::run::{TrackOptions, run_track as run_pass};
use tracing::info;

use crate::cmd::{Workspace, non_empty};

/// Report encodings for `sprintlog track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

/// Arguments for `sprintlog track`.
#[derive(Args, Debug, Default)]
pub struct TrackArgs {
    /// Only include items owned by this project key.
    #[arg(long)]
    pub project: Option<String>,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Only include this sprint.
    #[arg(long)]
    pub sprint_filter: Option<String>,

    /// Bucket size: daily, hourly or minutely. Defaults to `report.interval`
    /// from sprintlog.toml.
    #[arg(long)]
    pub interval: Option<String>,

    /// Report encoding.
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    pub format: ReportFormat,
}

/// Execute `sprintlog track`.
pub fn run_track(args: &TrackArgs, dir: Option<&Path>) -> Result<()> {
    let workspace = Workspace::load(dir)?;

    let interval = args
        .interval
        .as_deref()
        .unwrap_or(workspace.config.report.interval.as_str());
    let granularity: Granularity = interval.parse().context("invalid --interval")?;

    let opts = TrackOptions {
        project: non_empty(args.project.as_deref()),
        sprint_filter: non_empty(args.sprint_filter.as_deref()),
        granularity,
        now: Utc::now(),
    };

    let cache = workspace.open_cache()?;
    let outcome = run_pass(&cache, &workspace.config.fields, &opts)?;

    let emitter = ReportEmitter::new(workspace.config.report.statuses.clone());
    let out = args.out.as_ref().filter(|p| !p.as_os_str().is_empty());
    let rows = match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let rows = emit(&emitter, &outcome.aggregate, args.format, BufWriter::new(file))?;
            info!("wrote {rows} rows to {}", path.display());
            rows
        }
        None => emit(&emitter, &outcome.aggregate, args.format, io::stdout().lock())?,
    };

    info!(
        "{} items processed, {} skipped, {rows} rows",
        outcome.stats.processed,
        outcome.stats.skipped()
    );
    Ok(())
}

fn emit<W: Write>(
    emitter: &ReportEmitter,
    aggregate: &Aggregate,
    format: ReportFormat,
    sink: W,
) -> Result<usize> {
    let rows = match format {
        ReportFormat::Csv => emitter.write_csv(aggregate, sink)?,
        ReportFormat::Json => emitter.write_json(aggregate, sink)?,
    };
    Ok(rows)
}
