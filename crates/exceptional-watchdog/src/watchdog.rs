//! Watchdog handle.
//!
//! A [`Watchdog`] owns its deadline tracker, pending-interrupt cell, delivery
//! backend and timer thread. Production code normally uses the process-wide
//! instance in [`global`](crate::global); tests build as many independent
//! instances as they like.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::WatchdogConfig;
use crate::deadline::{DeadlineTracker, TrackerSnapshot};
use crate::error::{WatchdogError, WatchdogResult};
use crate::interrupt::{InterruptDelivery, PendingInterrupt, SafepointDelivery};
use crate::state::{DisarmOutcome, WatchdogStatus};
use crate::stats::{StatsCounters, WatchdogStats};
use crate::target::TargetThread;
use crate::timeout::Timeout;
use crate::timer;

/// State shared between the handle and its timer thread.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: WatchdogConfig,
    pub(crate) tracker: DeadlineTracker,
    pub(crate) pending: PendingInterrupt,
    pub(crate) delivery: Arc<dyn InterruptDelivery>,
    pub(crate) stats: StatsCounters,
    /// Set before the timer thread is spawned, cleared as soon as it stops
    /// serving deadlines.
    pub(crate) timer_running: AtomicBool,
    target: RwLock<Option<TargetThread>>,
}

impl Shared {
    pub(crate) fn target(&self) -> Option<TargetThread> {
        self.target.read().clone()
    }

    fn target_or_current(&self) -> TargetThread {
        if let Some(target) = self.target.read().as_ref() {
            return target.clone();
        }
        self.target
            .write()
            .get_or_insert_with(TargetThread::current)
            .clone()
    }
}

/// Watchdog timer that interrupts a target thread when it is not fed in time.
///
/// - [`feed`](Self::feed) starts or supersedes the deadline
/// - [`disarm`](Self::disarm) cancels it, reporting a fire that won the race
/// - [`checkpoint`](Self::checkpoint) is the target's safepoint: it returns
///   [`WatchdogError::Fired`] once per missed deadline
///
/// The target defaults to the thread that first feeds the watchdog.
///
/// # Thread Safety
///
/// All methods take `&self`; feeds from several threads are ordered by the
/// tracker's mutex and the last one wins.
pub struct Watchdog {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    /// Create a watchdog with the given configuration and delivery backend.
    ///
    /// The timer thread is not started until the first feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WatchdogConfig, delivery: Arc<dyn InterruptDelivery>) -> WatchdogResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, delivery))
    }

    /// Create a watchdog using [`SafepointDelivery`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: WatchdogConfig) -> WatchdogResult<Self> {
        Self::new(config, Arc::new(SafepointDelivery::new()))
    }

    /// Create a watchdog with the default configuration and `delivery`.
    #[must_use]
    pub fn with_delivery<D>(delivery: D) -> Self
    where
        D: InterruptDelivery + 'static,
    {
        Self::from_parts(WatchdogConfig::default(), Arc::new(delivery))
    }

    fn from_parts(config: WatchdogConfig, delivery: Arc<dyn InterruptDelivery>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                tracker: DeadlineTracker::new(),
                pending: PendingInterrupt::new(),
                delivery,
                stats: StatsCounters::default(),
                timer_running: AtomicBool::new(false),
                target: RwLock::new(None),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Arm or re-arm the watchdog for `millis` milliseconds.
    ///
    /// Each call fully supersedes the previous deadline, shorter or longer.
    ///
    /// # Errors
    ///
    /// - [`WatchdogError::InvalidDuration`] if `millis` is not positive or
    ///   exceeds the configured maximum; the pending deadline is unchanged.
    /// - [`WatchdogError::SignalSetup`] if the backend could not be armed.
    /// - [`WatchdogError::TimerSpawn`] if the timer thread could not start.
    pub fn feed(&self, millis: i64) -> WatchdogResult<()> {
        let timeout = Timeout::from_millis(millis).inspect_err(|_rejected| {
            self.shared.stats.record_rejected_feed();
        })?;
        self.feed_timeout(timeout)
    }

    /// Arm or re-arm the watchdog for `duration`.
    ///
    /// # Errors
    ///
    /// See [`feed`](Self::feed).
    pub fn feed_duration(&self, duration: Duration) -> WatchdogResult<()> {
        let timeout = Timeout::try_from(duration).inspect_err(|_rejected| {
            self.shared.stats.record_rejected_feed();
        })?;
        self.feed_timeout(timeout)
    }

    /// Arm or re-arm the watchdog with an already validated timeout.
    ///
    /// # Errors
    ///
    /// See [`feed`](Self::feed).
    pub fn feed_timeout(&self, timeout: Timeout) -> WatchdogResult<()> {
        let max = self.shared.config.max_timeout;
        if timeout.as_duration() > max {
            self.shared.stats.record_rejected_feed();
            return Err(WatchdogError::invalid_duration(format!(
                "{timeout} exceeds the configured maximum of {max:?}"
            )));
        }

        let target = self.shared.target_or_current();
        let expected_deadline = Instant::now()
            .checked_add(timeout.as_duration())
            .unwrap_or_else(Instant::now);
        self.shared.delivery.arm(&target, expected_deadline)?;

        let snapshot = self.shared.tracker.reset(timeout)?;
        self.shared.stats.record_feed();
        tracing::debug!(
            generation = snapshot.generation,
            timeout_ms = timeout.as_millis(),
            "Watchdog fed"
        );

        self.ensure_timer()
    }

    /// Equivalent to [`feed`](Self::feed).
    ///
    /// # Errors
    ///
    /// See [`feed`](Self::feed).
    pub fn arm(&self, millis: i64) -> WatchdogResult<()> {
        self.feed(millis)
    }

    /// Make `target` the thread to interrupt, then arm for `millis`.
    ///
    /// # Errors
    ///
    /// See [`feed`](Self::feed).
    pub fn arm_for(&self, target: TargetThread, millis: i64) -> WatchdogResult<()> {
        self.set_target(target);
        self.feed(millis)
    }

    /// Cancel the pending deadline.
    ///
    /// Never fails. If the timer thread committed a fire before this call
    /// took the lock, the result is [`DisarmOutcome::AlreadyFired`]. The same
    /// holds for a fire from an earlier cycle that no checkpoint consumed:
    /// it is reported here and dropped, so the target will not see it later.
    pub fn disarm(&self) -> DisarmOutcome {
        let (mut outcome, generation) = self.shared.tracker.clear_with_generation();
        if outcome.cancelled() {
            self.shared.delivery.cancel();
            self.shared.stats.record_disarm();
        }

        if let Some(stale) = self.shared.pending.discard_through(generation) {
            self.shared.stats.record_fire_discarded();
            if !matches!(outcome, DisarmOutcome::AlreadyFired { .. }) {
                outcome = DisarmOutcome::AlreadyFired {
                    generation: stale.generation,
                };
            }
        }
        tracing::debug!(outcome = ?outcome, "Watchdog disarmed");
        outcome
    }

    /// Safepoint for the target thread.
    ///
    /// Returns [`WatchdogError::Fired`] exactly once per missed deadline when
    /// called on the target thread; always `Ok` elsewhere. Cheap enough for
    /// tight loops: a single atomic load while nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Fired`] when the watchdog fired for this thread.
    #[inline]
    pub fn checkpoint(&self) -> WatchdogResult<()> {
        if !self.shared.pending.is_raised() {
            return Ok(());
        }
        match self.shared.pending.take_for(thread::current().id()) {
            Some(fired) => {
                self.shared.stats.record_interrupt_observed();
                tracing::debug!(generation = fired.generation, "Watchdog interrupt observed");
                Err(WatchdogError::Fired(fired))
            }
            None => Ok(()),
        }
    }

    /// Whether a fire is waiting for the calling thread, without consuming it.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        let me = thread::current().id();
        self.shared
            .pending
            .peek()
            .is_some_and(|fired| fired.target == me)
    }

    /// Replace the thread to interrupt.
    ///
    /// A fire still waiting for a different thread is dropped: only the
    /// target's checkpoint can consume it.
    pub fn set_target(&self, target: TargetThread) {
        let id = target.id();
        tracing::debug!(target = ?id, "Watchdog target set");
        *self.shared.target.write() = Some(target);

        if let Some(stranded) = self.shared.pending.discard_unless_for(id) {
            self.shared.stats.record_fire_discarded();
            tracing::debug!(
                generation = stranded.generation,
                previous_target = ?stranded.target,
                "Dropped unobserved fire for the previous target"
            );
        }
    }

    /// Thread that will be interrupted, if one has been registered.
    #[must_use]
    pub fn target(&self) -> Option<TargetThread> {
        self.shared.target()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> WatchdogStatus {
        self.shared.tracker.snapshot().status
    }

    /// Consistent view of deadline, generation and status.
    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.shared.tracker.snapshot()
    }

    /// Time left before the pending deadline.
    #[must_use]
    pub fn time_remaining(&self) -> Option<Duration> {
        self.snapshot().remaining(Instant::now())
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> WatchdogStats {
        self.shared.stats.snapshot()
    }

    /// Whether the timer thread is currently serving deadlines.
    ///
    /// Turns `false` as soon as a faulted thread starts unwinding, before the
    /// thread itself has finished.
    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.shared.timer_running.load(Ordering::Acquire)
    }

    /// Name of the delivery backend.
    #[must_use]
    pub fn delivery_name(&self) -> &'static str {
        self.shared.delivery.name()
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.shared.config
    }

    fn ensure_timer(&self) -> WatchdogResult<()> {
        let mut timer = self.timer.lock();
        if self.shared.timer_running.load(Ordering::Acquire) {
            return Ok(());
        }
        if timer.is_some() {
            if !self.shared.config.restart_timer_on_fault {
                return Ok(());
            }
            self.shared.stats.record_timer_restart();
            tracing::warn!("Restarting faulted watchdog timer thread");
        }

        self.shared.timer_running.store(true, Ordering::Release);
        match timer::spawn(Arc::clone(&self.shared)) {
            Ok(handle) => {
                // A faulted predecessor may still be unwinding; it is detached.
                *timer = Some(handle);
                Ok(())
            }
            Err(error) => {
                self.shared.timer_running.store(false, Ordering::Release);
                Err(error)
            }
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::from_parts(WatchdogConfig::default(), Arc::new(SafepointDelivery::new()))
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shared.tracker.shutdown();
        if let Some(handle) = self.timer.get_mut().take()
            && handle.thread().id() != thread::current().id()
            && handle.join().is_err()
        {
            tracing::debug!("Watchdog timer thread ended with a panic");
        }
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("config", &self.shared.config)
            .field("delivery", &self.shared.delivery.name())
            .field("status", &self.status())
            .field("timer_running", &self.is_timer_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_for_fire(watchdog: &Watchdog, limit: Duration) -> Option<WatchdogError> {
        let started = Instant::now();
        while started.elapsed() < limit {
            if let Err(error) = watchdog.checkpoint() {
                return Some(error);
            }
            thread::park_timeout(Duration::from_millis(1));
        }
        None
    }

    #[test]
    fn test_timer_starts_lazily() -> WatchdogResult<()> {
        let watchdog = Watchdog::default();
        assert!(!watchdog.is_timer_running());
        assert_eq!(watchdog.status(), WatchdogStatus::Unarmed);
        assert!(watchdog.target().is_none());

        watchdog.feed(10_000)?;
        assert!(watchdog.is_timer_running());
        assert_eq!(watchdog.status(), WatchdogStatus::Armed);
        assert!(watchdog.target().is_some_and(|t| t.is_current()));
        assert_eq!(watchdog.disarm(), DisarmOutcome::Disarmed { generation: 1 });
        Ok(())
    }

    #[test]
    fn test_fire_observed_once() -> WatchdogResult<()> {
        let watchdog = Watchdog::default();
        watchdog.feed(20)?;

        let error = wait_for_fire(&watchdog, Duration::from_secs(5));
        assert!(error.as_ref().is_some_and(WatchdogError::is_fired));
        assert_eq!(watchdog.status(), WatchdogStatus::Fired);

        watchdog.checkpoint()?;
        let stats = watchdog.stats();
        assert_eq!(stats.fires, 1);
        assert_eq!(stats.interrupts_observed, 1);
        Ok(())
    }

    #[test]
    fn test_rejected_feed_counts() {
        let watchdog = Watchdog::default();
        assert!(watchdog.feed(0).is_err());
        assert!(watchdog.feed_duration(Duration::ZERO).is_err());
        assert_eq!(watchdog.stats().rejected_feeds, 2);
        assert!(!watchdog.is_timer_running());
    }

    #[test]
    fn test_configured_max_timeout() -> WatchdogResult<()> {
        let config = WatchdogConfig::builder()
            .max_timeout(Duration::from_secs(1))
            .build()?;
        let watchdog = Watchdog::with_config(config)?;
        assert!(matches!(
            watchdog.feed(1001),
            Err(WatchdogError::InvalidDuration { .. })
        ));
        watchdog.feed(1000)?;
        assert_eq!(watchdog.stats().feeds, 1);
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WatchdogConfig {
            thread_name: String::new(),
            ..WatchdogConfig::default()
        };
        assert!(Watchdog::with_config(config).is_err());
    }

    #[test]
    fn test_time_remaining() -> WatchdogResult<()> {
        let watchdog = Watchdog::default();
        assert_eq!(watchdog.time_remaining(), None);
        watchdog.feed(60_000)?;
        let remaining = watchdog.time_remaining().unwrap_or_default();
        assert!(remaining > Duration::from_secs(59));
        assert!(remaining <= Duration::from_secs(60));
        Ok(())
    }

    #[test]
    fn test_debug_output() {
        let watchdog = Watchdog::default();
        let text = format!("{watchdog:?}");
        assert!(text.contains("safepoint"));
        assert!(text.contains("Unarmed"));
    }
}
