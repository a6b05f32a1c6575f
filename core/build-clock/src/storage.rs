//! Storage configuration and path management for build-clock.
//!
//! `StorageConfig` is the single place that decides where daily records and
//! the counter lock live. Production code uses [`StorageConfig::from_env`],
//! tests use [`StorageConfig::with_root`] with a temp directory.

use chrono::NaiveDate;
use fs_err as fs;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BuildClockError, Result};

/// Environment variable that overrides the default log root.
pub const ROOT_ENV_VAR: &str = "BUILD_CLOCK_ROOT";

const DEFAULT_ROOT_DIR: &str = ".build-log";
const RECORD_PREFIX: &str = "build-log-";
const RECORD_SUFFIX: &str = ".txt";
const LOCK_FILE: &str = "build-log.lock";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Central configuration for build-clock storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one record per day (default: ~/.build-log)
    root: PathBuf,
    /// How long `add`/`save` wait for the counter lock before giving up.
    lock_timeout: Duration,
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Resolves the log root from `BUILD_CLOCK_ROOT`, falling back to
    /// `~/.build-log`. Returns None when neither is available.
    pub fn from_env() -> Option<Self> {
        if let Some(root) = env::var_os(ROOT_ENV_VAR).filter(|value| !value.is_empty()) {
            return Some(Self::with_root(PathBuf::from(root)));
        }
        dirs::home_dir().map(|home| Self::with_root(home.join(DEFAULT_ROOT_DIR)))
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Creates the log root if it does not exist yet.
    ///
    /// Called once at startup; writes never create the root on their own.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| BuildClockError::RootCreateFailed {
            path: self.root.clone(),
            source,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to the record for a calendar day.
    /// Example: ~/.build-log/build-log-2026-10-17.txt
    pub fn record_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(record_file_name(date))
    }

    /// Where a corrupt record is moved before it is overwritten.
    ///
    /// `attempt` starts at 1 and is bumped until the name is free, so every
    /// corruption of the same day keeps its own copy.
    /// Example: ~/.build-log/build-log-2026-10-17.txt.corrupt-1
    pub fn quarantine_path(&self, date: NaiveDate, attempt: u32) -> PathBuf {
        self.root
            .join(format!("{}.corrupt-{}", record_file_name(date), attempt))
    }

    /// Path to the advisory lock shared by every writer of this root.
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Path to the logs/ directory used by the hook binary.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

fn record_file_name(date: NaiveDate) -> String {
    format!(
        "{}{}{}",
        RECORD_PREFIX,
        date.format("%Y-%m-%d"),
        RECORD_SUFFIX
    )
}

/// Parses the date back out of a record file name.
///
/// Returns None for anything that is not exactly `build-log-YYYY-MM-DD.txt`.
pub fn parse_record_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(RECORD_PREFIX)?.strip_suffix(RECORD_SUFFIX)?;
    if stem.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
