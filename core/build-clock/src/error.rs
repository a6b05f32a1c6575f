//! Error types for build-clock operations.

use std::path::PathBuf;

/// All errors that can occur while recording build time.
///
/// Timer sequencing problems (an end without a begin, a repeated begin) are
/// not represented here: the timer degrades to a zero-length measurement.
#[derive(Debug, thiserror::Error)]
pub enum BuildClockError {
    // ─────────────────────────────────────────────────────────────────────
    // Record Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Record content is not a non-negative integer: {path}: {content:?}")]
    CorruptState { path: PathBuf, content: String },

    #[error("Failed to read record: {path}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record: {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Log Root Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Log root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("Failed to create log root: {path}: {source}")]
    RootCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out waiting for counter lock: {path}")]
    LockTimeout { path: PathBuf },

    #[error("Failed to open counter lock: {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using BuildClockError.
pub type Result<T> = std::result::Result<T, BuildClockError>;
