//! Errors surfaced by the build-hook subcommands.

use build_clock::BuildClockError;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Cannot determine log root: pass --root or set BUILD_CLOCK_ROOT")]
    NoRoot,

    #[error("Failed to read events from stdin: {0}")]
    ReadInput(#[source] std::io::Error),

    #[error(transparent)]
    Clock(#[from] BuildClockError),

    #[error("{seconds}s of build time could not be written: {source}")]
    Unflushed {
        seconds: u64,
        #[source]
        source: BuildClockError,
    },

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}
