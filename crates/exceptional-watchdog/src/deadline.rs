//! Monotonic deadline tracker shared by feeders and the timer thread.
//!
//! Every field lives behind one mutex, so a feed and the timer thread's
//! firing decision are totally ordered: the timer thread either sees the new
//! generation before it commits, or it committed first and the feeder starts
//! a fresh cycle.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{WatchdogError, WatchdogResult};
use crate::state::{DisarmOutcome, WatchdogStatus};
use crate::timeout::Timeout;

/// Consistent view of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSnapshot {
    /// Absolute deadline of the pending cycle.
    pub deadline: Option<Instant>,
    /// Timeout of the pending cycle.
    pub timeout: Option<Timeout>,
    /// Number of successful resets so far.
    pub generation: u64,
    /// Current status.
    pub status: WatchdogStatus,
}

impl TrackerSnapshot {
    /// Time left until the pending deadline, measured from `now`.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

/// Fire committed by [`DeadlineTracker::wait_for_expiry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expired {
    pub generation: u64,
    pub timeout: Timeout,
    pub lateness: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    deadline: Instant,
    timeout: Timeout,
}

#[derive(Debug, Default)]
struct TrackerState {
    pending: Option<Pending>,
    generation: u64,
    status: WatchdogStatus,
    fired_generation: Option<u64>,
    shutdown: bool,
}

impl TrackerState {
    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            deadline: self.pending.map(|p| p.deadline),
            timeout: self.pending.map(|p| p.timeout),
            generation: self.generation,
            status: self.status,
        }
    }
}

/// Deadline, generation and status of one watchdog.
#[derive(Debug, Default)]
pub struct DeadlineTracker {
    state: Mutex<TrackerState>,
    wakeup: Condvar,
}

impl DeadlineTracker {
    /// Create an unarmed tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cycle ending `timeout` from now.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidDuration`] if the deadline cannot be
    /// represented on the monotonic clock.
    pub fn reset(&self, timeout: Timeout) -> WatchdogResult<TrackerSnapshot> {
        self.reset_at(timeout, Instant::now())
    }

    /// Start a new cycle ending `timeout` after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidDuration`] if the deadline cannot be
    /// represented on the monotonic clock.
    pub fn reset_at(&self, timeout: Timeout, now: Instant) -> WatchdogResult<TrackerSnapshot> {
        let deadline = now.checked_add(timeout.as_duration()).ok_or_else(|| {
            WatchdogError::invalid_duration(format!("{timeout} overflows the monotonic clock"))
        })?;

        let snapshot = {
            let mut state = self.state.lock();
            state.pending = Some(Pending { deadline, timeout });
            state.generation = state.generation.wrapping_add(1);
            state.status = WatchdogStatus::Armed;
            state.snapshot()
        };
        self.wakeup.notify_one();
        Ok(snapshot)
    }

    /// Cancel the pending cycle, if any.
    pub fn clear(&self) -> DisarmOutcome {
        self.clear_with_generation().0
    }

    /// Cancel the pending cycle and return the last generation handed out.
    ///
    /// Every fire the timer can still post carries a generation no greater
    /// than the returned one.
    pub(crate) fn clear_with_generation(&self) -> (DisarmOutcome, u64) {
        let cleared = {
            let mut state = self.state.lock();
            let outcome = match state.status {
                WatchdogStatus::Armed => DisarmOutcome::Disarmed {
                    generation: state.generation,
                },
                WatchdogStatus::Fired => DisarmOutcome::AlreadyFired {
                    generation: state.fired_generation.unwrap_or(state.generation),
                },
                WatchdogStatus::Unarmed => DisarmOutcome::NotArmed,
            };
            state.pending = None;
            state.status = WatchdogStatus::Unarmed;
            (outcome, state.generation)
        };
        self.wakeup.notify_one();
        cleared
    }

    /// Take a consistent snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.state.lock().snapshot()
    }

    /// Ask the timer thread to exit.
    pub(crate) fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.wakeup.notify_all();
    }

    /// Block until a deadline is missed, then commit the fire.
    ///
    /// Returns `None` once [`shutdown`](Self::shutdown) has been requested.
    /// The commit happens under the same lock as `reset` and `clear`, and only
    /// for the generation the caller slept on.
    pub(crate) fn wait_for_expiry(&self) -> Option<Expired> {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return None;
            }

            let Some(pending) = state.pending.filter(|_| state.status.is_armed()) else {
                self.wakeup.wait(&mut state);
                continue;
            };

            let generation = state.generation;
            let now = Instant::now();
            if now < pending.deadline {
                if !self
                    .wakeup
                    .wait_until(&mut state, pending.deadline)
                    .timed_out()
                    && state.generation != generation
                {
                    tracing::trace!(generation, "Watchdog deadline superseded");
                }
                continue;
            }

            state.pending = None;
            state.status = WatchdogStatus::Fired;
            state.fired_generation = Some(generation);
            return Some(Expired {
                generation,
                timeout: pending.timeout,
                lateness: now.saturating_duration_since(pending.deadline),
            });
        }
    }
}
