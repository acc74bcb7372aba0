//! `sprintlog windows`: dump every reconstructed membership window.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use sprintlog_core::run::{RunStats, TrackOptions, build_timeline};
use sprintlog_core::timeline::AggregationState;

use crate::cmd::{Workspace, non_empty};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `sprintlog windows`.
#[derive(Args, Debug, Default)]
pub struct WindowsArgs {
    /// Only include items owned by this project key.
    #[arg(long)]
    pub project: Option<String>,

    /// Only include this sprint.
    #[arg(long)]
    pub sprint_filter: Option<String>,
}

#[derive(Debug, Serialize)]
struct WindowRow {
    item: String,
    sprint: String,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
    estimate: f64,
    status: String,
}

/// Payload for `sprintlog windows`.
#[derive(Debug, Serialize)]
struct WindowDump {
    windows: Vec<WindowRow>,
    stats: RunStats,
}

impl WindowDump {
    fn from_state(state: &AggregationState, stats: RunStats) -> Self {
        let mut windows = Vec::with_capacity(state.window_count());
        for (pair, pair_windows) in state.windows() {
            let meta = state.meta(pair).cloned().unwrap_or_default();
            for window in pair_windows {
                windows.push(WindowRow {
                    item: pair.item.to_string(),
                    sprint: pair.sprint.clone(),
                    from: window.from,
                    to: window.to,
                    estimate: meta.estimate,
                    status: meta.status.clone(),
                });
            }
        }
        Self { windows, stats }
    }
}

/// Execute `sprintlog windows`.
pub fn run_windows(args: &WindowsArgs, output: OutputMode, dir: Option<&Path>) -> Result<()> {
    let workspace = Workspace::load(dir)?;
    let cache = workspace.open_cache()?;
    let opts = TrackOptions {
        project: non_empty(args.project.as_deref()),
        sprint_filter: non_empty(args.sprint_filter.as_deref()),
        ..TrackOptions::default()
    };

    let (state, stats) = build_timeline(&cache, &workspace.config.fields, &opts)?;
    let dump = WindowDump::from_state(&state, stats);
    render_mode(output, &dump, render_text, render_pretty)
}

fn bound(ts: Option<&DateTime<Utc>>) -> String {
    ts.map_or_else(|| "open".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn render_text(dump: &WindowDump, w: &mut dyn Write) -> io::Result<()> {
    for row in &dump.windows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{:.1}\t{}",
            row.item,
            row.sprint,
            row.from.to_rfc3339(),
            row.to.map_or_else(String::new, |t| t.to_rfc3339()),
            row.estimate,
            row.status
        )?;
    }
    Ok(())
}

fn render_pretty(dump: &WindowDump, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Sprint windows")?;
    if dump.windows.is_empty() {
        writeln!(w, "(none)")?;
    }
    for row in &dump.windows {
        let status = if row.status.is_empty() { "-" } else { row.status.as_str() };
        writeln!(
            w,
            "{:<12} {:<24} {} -> {}  [{:.1} pts, {status}]",
            row.item,
            row.sprint,
            bound(Some(&row.from)),
            bound(row.to.as_ref()),
            row.estimate
        )?;
    }
    writeln!(w)?;

    let stats = &dump.stats;
    pretty_section(w, "Run")?;
    pretty_kv(w, "items", stats.seen.to_string())?;
    pretty_kv(w, "processed", stats.processed.to_string())?;
    pretty_kv(w, "skipped", stats.skipped().to_string())?;
    pretty_kv(w, "dropped", format!("{} history entries", stats.entries_dropped))?;
    pretty_kv(
        w,
        "origins",
        format!(
            "own {}, parent {}, synthesized {}, empty {}",
            stats.origins.own, stats.origins.parent, stats.origins.synthesized, stats.origins.empty
        ),
    )
}
