//! Build timer state machine.
//!
//! ```text
//! Idle    --begin-->        Running(now)
//! Running --begin-->        Running(now)   restart, builds never nest
//! Running --end/cancel-->   Idle           returns now - started_at
//! Idle    --end/cancel-->   Idle           returns zero
//! ```
//!
//! The timer only measures. Crediting the result to a day is the caller's job.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        started_at: Instant,
    },
}

#[derive(Debug)]
pub struct BuildTimer<C: Clock = SystemClock> {
    clock: C,
    state: TimerState,
}

impl Default for BuildTimer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> BuildTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: TimerState::Idle,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Starts measuring. A second begin without an end restarts the measurement.
    pub fn begin(&mut self) {
        if self.is_running() {
            debug!("Build begin while running, restarting measurement");
        }
        self.state = TimerState::Running {
            started_at: self.clock.now(),
        };
    }

    /// Stops measuring and returns how long the build ran.
    pub fn end(&mut self) -> Duration {
        self.stop()
    }

    /// Same as [`BuildTimer::end`]: a cancelled build still counts.
    pub fn cancel(&mut self) -> Duration {
        self.stop()
    }

    fn stop(&mut self) -> Duration {
        match std::mem::take(&mut self.state) {
            TimerState::Running { started_at } => {
                self.clock.now().saturating_duration_since(started_at)
            }
            TimerState::Idle => {
                debug!("Build end without begin, measured zero");
                Duration::ZERO
            }
        }
    }
}

/// Floors a measured duration to the whole seconds stored in a record.
pub fn whole_seconds(elapsed: Duration) -> u64 {
    elapsed.as_secs()
}
