//! Watchdog counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of watchdog counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatchdogStats {
    /// Successful feeds (including arms).
    pub feeds: u64,
    /// Feeds rejected with `InvalidDuration`.
    pub rejected_feeds: u64,
    /// Deadlines missed.
    pub fires: u64,
    /// Disarms that cancelled a pending deadline.
    pub disarms: u64,
    /// Fires whose delivery backend reported an error.
    pub delivery_failures: u64,
    /// Timer threads started after the first one.
    pub timer_restarts: u64,
    /// Timer threads that died from a panic.
    pub timer_faults: u64,
    /// Interruptions consumed by a target's checkpoint.
    pub interrupts_observed: u64,
    /// Fires dropped before any checkpoint saw them, for instance by a
    /// disarm or a change of target.
    #[serde(default)]
    pub fires_discarded: u64,
}

impl WatchdogStats {
    /// Fires still waiting for a checkpoint.
    ///
    /// Fires counted in `fires_discarded` are excluded: nothing will ever
    /// observe them.
    #[must_use]
    pub fn unobserved_fires(&self) -> u64 {
        self.fires
            .saturating_sub(self.interrupts_observed)
            .saturating_sub(self.fires_discarded)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    feeds: AtomicU64,
    rejected_feeds: AtomicU64,
    fires: AtomicU64,
    disarms: AtomicU64,
    delivery_failures: AtomicU64,
    timer_restarts: AtomicU64,
    timer_faults: AtomicU64,
    interrupts_observed: AtomicU64,
    fires_discarded: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_feed(&self) {
        self.feeds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_feed(&self) {
        self.rejected_feeds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fire(&self) {
        self.fires.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disarm(&self) {
        self.disarms.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timer_restart(&self) {
        self.timer_restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timer_fault(&self) {
        self.timer_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interrupt_observed(&self) {
        self.interrupts_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fire_discarded(&self) {
        self.fires_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WatchdogStats {
        WatchdogStats {
            feeds: self.feeds.load(Ordering::Relaxed),
            rejected_feeds: self.rejected_feeds.load(Ordering::Relaxed),
            fires: self.fires.load(Ordering::Relaxed),
            disarms: self.disarms.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            timer_restarts: self.timer_restarts.load(Ordering::Relaxed),
            timer_faults: self.timer_faults.load(Ordering::Relaxed),
            interrupts_observed: self.interrupts_observed.load(Ordering::Relaxed),
            fires_discarded: self.fires_discarded.load(Ordering::Relaxed),
        }
    }
}
