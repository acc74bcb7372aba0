//! `sprintlog members`: list items currently in a sprint.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sprintlog_core::query::sprint_members;

use crate::cmd::{Workspace, non_empty};
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `sprintlog members`.
#[derive(Args, Debug)]
pub struct MembersArgs {
    /// Sprint name to look up.
    pub sprint: String,

    /// Only include items owned by this project key.
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
struct Members {
    sprint: String,
    members: Vec<String>,
}

/// Execute `sprintlog members`.
pub fn run_members(args: &MembersArgs, output: OutputMode, dir: Option<&Path>) -> Result<()> {
    let workspace = Workspace::load(dir)?;
    let cache = workspace.open_cache()?;
    let project = non_empty(args.project.as_deref());

    let keys = sprint_members(&cache, &args.sprint, project.as_deref())?;
    let payload = Members {
        sprint: args.sprint.clone(),
        members: keys.iter().map(ToString::to_string).collect(),
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(payload: &Members, w: &mut dyn Write) -> io::Result<()> {
    for key in &payload.members {
        writeln!(w, "{key}")?;
    }
    Ok(())
}

fn render_pretty(payload: &Members, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Members of {}", payload.sprint))?;
    if payload.members.is_empty() {
        return writeln!(w, "(none)");
    }
    for (n, key) in payload.members.iter().enumerate() {
        writeln!(w, "{:>3}. {key}", n + 1)?;
    }
    Ok(())
}
