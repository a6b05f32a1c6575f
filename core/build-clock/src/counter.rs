//! File-backed daily build time counter.
//!
//! One record per calendar day, `build-log-YYYY-MM-DD.txt` in the log root,
//! holding the decimal seconds spent building that day and nothing else.
//!
//! # Missing and Corrupt Records
//!
//! - Missing file or empty content → total is 0
//! - Content that is not a non-negative integer → total is 0, with a warning.
//!   Before `add` overwrites such a record it is renamed to `*.corrupt-N`
//!   (first free N) so the original bytes survive, however often it happens.
//!
//! The same policy applies to `load`, `add` and `history`. `history` also
//! skips, with a warning, any record it cannot read at all.
//!
//! # Writes
//!
//! `add` and `save` hold an exclusive advisory lock on `build-log.lock` for
//! the whole read-modify-write, so writers in other processes cannot lose
//! each other's updates. The record itself is replaced atomically: temp file
//! in the same directory, fsync, rename.

use chrono::NaiveDate;
use fs4::fs_std::FileExt;
use fs_err as fs;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{BuildClockError, Result};
use crate::storage::{parse_record_file_name, StorageConfig};

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Accumulated build time for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DailyCounterStore {
    config: StorageConfig,
}

impl DailyCounterStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the accumulated seconds for `date`.
    pub fn load(&self, date: NaiveDate) -> Result<u64> {
        let path = self.config.record_path(date);
        match read_total(&path) {
            Ok(total) => Ok(total.unwrap_or(0)),
            Err(err @ BuildClockError::CorruptState { .. }) => {
                warn!(error = %err, "Treating corrupt record as zero");
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    /// Adds `extra_seconds` to the total for `date` and returns the new total.
    pub fn add(&self, date: NaiveDate, extra_seconds: u64) -> Result<u64> {
        let _lock = self.lock()?;
        let path = self.config.record_path(date);

        let current = match read_total(&path) {
            Ok(total) => total.unwrap_or(0),
            Err(err @ BuildClockError::CorruptState { .. }) => {
                let quarantine = self.quarantine(date, &path)?;
                warn!(
                    error = %err,
                    quarantine = %quarantine.display(),
                    "Reset corrupt record to zero"
                );
                0
            }
            Err(err) => return Err(err),
        };

        let total = current.saturating_add(extra_seconds);
        self.write_record(&path, total)?;
        info!(
            date = %date,
            added_secs = extra_seconds,
            total_secs = total,
            "Build time recorded"
        );
        Ok(total)
    }

    /// Replaces the total for `date`.
    pub fn save(&self, date: NaiveDate, total_seconds: u64) -> Result<()> {
        let _lock = self.lock()?;
        let path = self.config.record_path(date);
        self.write_record(&path, total_seconds)?;
        debug!(date = %date, total_secs = total_seconds, "Record saved");
        Ok(())
    }

    /// Every day that has a record, oldest first.
    ///
    /// A record that cannot be read is logged and left out of the listing.
    pub fn history(&self) -> Result<Vec<DayTotal>> {
        let root = self.config.root();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(BuildClockError::StorageRead {
                    path: root.to_path_buf(),
                    source,
                })
            }
        };

        let mut days = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BuildClockError::StorageRead {
                path: root.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(parse_record_file_name) else {
                continue;
            };
            match self.load(date) {
                Ok(total_seconds) => days.push(DayTotal {
                    date,
                    total_seconds,
                }),
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable record in history");
                }
            }
        }

        days.sort_by_key(|day| day.date);
        Ok(days)
    }

    /// Moves a corrupt record aside under the first free quarantine name.
    /// Runs under the counter lock, so no other writer can take that name.
    fn quarantine(&self, date: NaiveDate, path: &Path) -> Result<PathBuf> {
        let mut attempt = 1;
        let quarantine = loop {
            let candidate = self.config.quarantine_path(date, attempt);
            if !candidate.exists() {
                break candidate;
            }
            attempt += 1;
        };

        fs::rename(path, &quarantine).map_err(|source| BuildClockError::StorageWrite {
            path: quarantine.clone(),
            source,
        })?;
        Ok(quarantine)
    }

    fn write_record(&self, path: &Path, total_seconds: u64) -> Result<()> {
        let write_err = |source: std::io::Error| BuildClockError::StorageWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(self.config.root()).map_err(write_err)?;
        temp_file
            .write_all(total_seconds.to_string().as_bytes())
            .map_err(write_err)?;
        temp_file.as_file().sync_all().map_err(write_err)?;
        temp_file.persist(path).map_err(|err| write_err(err.error))?;
        Ok(())
    }

    fn lock(&self) -> Result<CounterLock> {
        let root = self.config.root();
        if !root.is_dir() {
            return Err(BuildClockError::RootMissing(root.to_path_buf()));
        }

        let lock_path = self.config.lock_file();
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| BuildClockError::LockFailed {
                path: lock_path.clone(),
                source,
            })?;

        let start = Instant::now();
        loop {
            if lock_acquired(FileExt::try_lock_exclusive(file.file()), &lock_path)? {
                return Ok(CounterLock { file });
            }

            if start.elapsed() >= self.config.lock_timeout() {
                return Err(BuildClockError::LockTimeout { path: lock_path });
            }

            thread::sleep(LOCK_RETRY_INTERVAL);
        }
    }
}

struct CounterLock {
    file: fs::File,
}

impl Drop for CounterLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(self.file.file());
    }
}

/// `Ok(false)` means another writer holds the lock; real I/O errors are
/// returned instead of being retried until the timeout.
fn lock_acquired(attempt: std::io::Result<bool>, lock_path: &Path) -> Result<bool> {
    attempt.map_err(|source| BuildClockError::LockFailed {
        path: lock_path.to_path_buf(),
        source,
    })
}

/// Reads a record. `Ok(None)` means there is no record for that day.
fn read_total(path: &Path) -> Result<Option<u64>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(BuildClockError::StorageRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_total(&content)
        .map(Some)
        .ok_or_else(|| BuildClockError::CorruptState {
            path: path.to_path_buf(),
            content,
        })
}

fn parse_total(content: &str) -> Option<u64> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
