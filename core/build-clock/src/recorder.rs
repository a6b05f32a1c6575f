//! Host-facing glue: lifecycle callbacks in, persisted daily totals out.
//!
//! The host only has to call the four [`BuildEventSink`] methods, one at a
//! time and in order. [`BuildRecorder`] owns the timer and the store and
//! credits each finished build to the day it finished on.
//!
//! If a write fails the measured seconds stay in a per-day pending buffer and
//! are retried on the next finished build or on [`BuildRecorder::flush_pending`].

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::counter::DailyCounterStore;
use crate::error::Result;
use crate::timer::{whole_seconds, BuildTimer};

/// Build lifecycle notifications a host delivers.
///
/// Terminal callbacks return the day's new total when something was
/// persisted, or `None` when no build was running.
pub trait BuildEventSink {
    fn on_build_begin(&mut self);

    fn on_build_done(&mut self, succeeded: bool, modified: bool, cancelled: bool)
        -> Result<Option<u64>>;

    fn on_build_cancel(&mut self) -> Result<Option<u64>>;

    fn on_active_configuration_changed(&mut self);
}

pub struct BuildRecorder<C: Clock = SystemClock> {
    timer: BuildTimer<C>,
    store: DailyCounterStore,
    pending: BTreeMap<NaiveDate, u64>,
}

impl BuildRecorder<SystemClock> {
    pub fn new(store: DailyCounterStore) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<C: Clock> BuildRecorder<C> {
    pub fn with_clock(store: DailyCounterStore, clock: C) -> Self {
        Self {
            timer: BuildTimer::new(clock),
            store,
            pending: BTreeMap::new(),
        }
    }

    pub fn timer(&self) -> &BuildTimer<C> {
        &self.timer
    }

    pub fn store(&self) -> &DailyCounterStore {
        &self.store
    }

    /// Seconds measured but not yet written, per day.
    pub fn pending(&self) -> &BTreeMap<NaiveDate, u64> {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Writes every pending day. Days that fail stay pending.
    ///
    /// Returns the first error after attempting all days.
    pub fn flush_pending(&mut self) -> Result<()> {
        let mut first_err = None;
        let days: Vec<NaiveDate> = self.pending.keys().copied().collect();
        for date in days {
            if let Err(err) = self.write_pending(date) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn write_pending(&mut self, date: NaiveDate) -> Result<Option<u64>> {
        let Some(&seconds) = self.pending.get(&date) else {
            return Ok(None);
        };
        match self.store.add(date, seconds) {
            Ok(total) => {
                self.pending.remove(&date);
                Ok(Some(total))
            }
            Err(err) => {
                warn!(
                    date = %date,
                    pending_secs = seconds,
                    error = %err,
                    "Build time kept pending"
                );
                Err(err)
            }
        }
    }

    fn finish(&mut self, kind: &'static str, elapsed_secs: Option<u64>) -> Result<Option<u64>> {
        let Some(elapsed_secs) = elapsed_secs else {
            debug!(event = kind, "No build running, nothing recorded");
            return Ok(None);
        };

        let today = self.timer.clock().today();
        debug!(event = kind, date = %today, elapsed_secs, "Build finished");

        let seconds = self.pending.entry(today).or_insert(0);
        *seconds = seconds.saturating_add(elapsed_secs);

        // Earlier days left over from failed writes go first, to their own day.
        let earlier: Vec<NaiveDate> = self
            .pending
            .keys()
            .copied()
            .filter(|date| *date != today)
            .collect();
        for date in earlier {
            let _ = self.write_pending(date);
        }

        self.write_pending(today)
    }

    fn stop(&mut self, cancelled: bool) -> Option<u64> {
        if !self.timer.is_running() {
            return None;
        }
        let elapsed = if cancelled {
            self.timer.cancel()
        } else {
            self.timer.end()
        };
        Some(whole_seconds(elapsed))
    }
}

impl<C: Clock> BuildEventSink for BuildRecorder<C> {
    fn on_build_begin(&mut self) {
        debug!("Build started");
        self.timer.begin();
    }

    fn on_build_done(
        &mut self,
        succeeded: bool,
        modified: bool,
        cancelled: bool,
    ) -> Result<Option<u64>> {
        debug!(succeeded, modified, cancelled, "Build done");
        let elapsed = self.stop(false);
        self.finish("build_done", elapsed)
    }

    fn on_build_cancel(&mut self) -> Result<Option<u64>> {
        let elapsed = self.stop(true);
        self.finish("build_cancel", elapsed)
    }

    fn on_active_configuration_changed(&mut self) {
        debug!("Active configuration changed, ignored");
    }
}
