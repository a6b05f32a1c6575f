//! build-hook: host-side adapter that records time spent building.
//!
//! A host (IDE extension, build wrapper, CI step) pipes its build lifecycle
//! notifications into `build-hook watch`, one JSON object per line. Totals
//! land in one file per day under the log root.
//!
//! ## Subcommands
//!
//! - `watch`: Main event loop, reads JSON lines from stdin
//! - `total`: Print the accumulated build time for one day
//! - `history`: Print every recorded day

mod error;
mod handle;
mod logging;
mod report;

use build_clock::StorageConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::HookError;

#[derive(Parser)]
#[command(name = "build-hook")]
#[command(about = "Records time spent building, per day")]
#[command(version)]
struct Cli {
    /// Directory holding the daily build-log records
    /// (default: $BUILD_CLOCK_ROOT, then ~/.build-log)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record build time from lifecycle events (reads JSON lines from stdin)
    Watch,

    /// Print the accumulated build time for a day
    Total {
        /// Day to report (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },

    /// Print every recorded day
    History {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = cli
        .root
        .map(StorageConfig::with_root)
        .or_else(StorageConfig::from_env);

    // Only the long-running watcher keeps a log file; reports log to stderr.
    let log_dir = match (&cli.command, &config) {
        (Commands::Watch, Some(config)) => Some(config.logs_dir()),
        _ => None,
    };
    let logging_guard = logging::init(log_dir.as_deref());

    let result = config.ok_or(HookError::NoRoot).and_then(|config| match cli.command {
        Commands::Watch => handle::run(config),
        Commands::Total { date } => report::total(&config, date),
        Commands::History { json } => report::history(&config, json),
    });

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "build-hook failed");
            1
        }
    };

    drop(logging_guard);
    std::process::exit(code);
}
