//! # build-clock
//!
//! Measures how long builds take and keeps a running total per calendar day.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency, no internal threads.
//! - **Host-agnostic**: Hosts drive a [`BuildRecorder`] through the
//!   [`BuildEventSink`] callbacks; nothing here knows how events are delivered.
//! - **Measurement never fails**: an end without a begin measures zero.
//! - **Persistence failures are loud**: write errors are returned, and the
//!   measured seconds stay pending until a write succeeds.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use build_clock::{BuildEventSink, BuildRecorder, DailyCounterStore, StorageConfig};
//!
//! let config = StorageConfig::from_env().expect("no home directory");
//! config.ensure_root()?;
//! let mut recorder = BuildRecorder::new(DailyCounterStore::new(config));
//!
//! recorder.on_build_begin();
//! // ... build runs ...
//! let today_total = recorder.on_build_done(true, true, false)?;
//! ```

pub mod clock;
pub mod counter;
pub mod error;
pub mod recorder;
pub mod storage;
pub mod timer;

// Re-export commonly used items at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{DailyCounterStore, DayTotal};
pub use error::{BuildClockError, Result};
pub use recorder::{BuildEventSink, BuildRecorder};
pub use storage::StorageConfig;
pub use timer::{whole_seconds, BuildTimer, TimerState};
