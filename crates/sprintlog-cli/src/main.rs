#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sprintlog: sprint membership timelines from cached tracker changelogs",
    long_about = None
)]
struct Cli {
    /// Cache directory written by the fetcher (default: user config, then `issues`).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable debug logging (one line per sprint change).
    #[arg(long, global = true)]
    debug: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Write the bucketed sprint report",
        long_about = "Rebuild every item's sprint membership windows and write one row per (bucket, sprint) as CSV.",
        after_help = "EXAMPLES:\n    # Daily report for one project to a file\n    sprintlog track --project ABC --out report.csv\n\n    # Hourly buckets for a single sprint\n    sprintlog track --interval hourly --sprint-filter \"Sprint 42\"\n\n    # Rows as JSON\n    sprintlog track --format json"
    )]
    Track(cmd::track::TrackArgs),

    #[command(
        about = "Dump reconstructed membership windows",
        long_about = "Print every (item, sprint) window with the estimate and status captured when the item first joined.",
        after_help = "EXAMPLES:\n    # Inspect one sprint\n    sprintlog windows --sprint-filter \"Sprint 42\"\n\n    # Emit machine-readable output\n    sprintlog windows --json"
    )]
    Windows(cmd::windows::WindowsArgs),

    #[command(
        about = "List items currently in a sprint",
        after_help = "EXAMPLES:\n    sprintlog members \"Sprint 42\" --project ABC"
    )]
    Members(cmd::members::MembersArgs),

    #[command(about = "Generate shell completions")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_env("SPRINTLOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if debug || env::var("DEBUG").is_ok() {
            "sprintlog=debug,info"
        } else {
            "sprintlog=info,warn"
        })
    });

    let format = env::var("SPRINTLOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output = cli.output_mode();
    let dir = cli.dir.as_deref();
    debug!("output mode {output:?}");

    let result = match &cli.command {
        Commands::Track(args) => cmd::track::run_track(args, dir),
        Commands::Windows(args) => cmd::windows::run_windows(args, output, dir),
        Commands::Members(args) => cmd::members::run_members(args, output, dir),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from_anyhow(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
