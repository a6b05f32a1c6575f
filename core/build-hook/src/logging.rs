//! Tracing setup for build-hook.
//!
//! Always logs to stderr. When a log directory is given, also writes a
//! daily-rolling `build-hook.log` there through a non-blocking writer; keep the
//! returned guard alive until exit so buffered lines are flushed.

use fs_err as fs;
use std::env;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEBUG_ENV: &str = "BUILD_CLOCK_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "build-hook.log";

pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let file_dir = log_dir.filter(|dir| match fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(err) => {
            eprintln!("build-hook: file logging disabled: {}", err);
            false
        }
    });

    match file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .init();
            None
        }
    }
}

fn env_filter() -> EnvFilter {
    if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
