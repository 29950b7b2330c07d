//! Interrupt delivery.
//!
//! Rust has no safe way to unwind another thread out of arbitrary code, so an
//! interruption is split in two halves:
//!
//! 1. The timer thread posts a [`WatchdogFired`] into the watchdog's
//!    [`PendingInterrupt`] cell and asks an [`InterruptDelivery`] backend to
//!    get the target's attention (unpark, signal, host callback).
//! 2. The target turns the pending interrupt into an ordinary error at its
//!    next safepoint, [`Watchdog::checkpoint`](crate::Watchdog::checkpoint),
//!    where the surrounding `?` and `match` handle it.
//!
//! The target's stack and registers are never touched directly.

mod callback;
mod safepoint;
#[cfg(unix)]
mod signal;

pub use callback::{CallbackDelivery, InterruptCallback};
pub use safepoint::SafepointDelivery;
#[cfg(unix)]
pub use signal::SignalDelivery;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;
use std::time::Instant;

use crate::error::{WatchdogFired, WatchdogResult};
use crate::target::TargetThread;

/// Platform capability that gets a target thread's attention when the
/// watchdog fires.
///
/// `deliver` runs on the timer thread after the fire has been committed and
/// posted; it must not block for long.
pub trait InterruptDelivery: Send + Sync + std::fmt::Debug {
    /// Prepare for a cycle ending at `deadline`. Called on every feed, before
    /// the deadline is recorded; an error leaves the watchdog unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be made ready.
    fn arm(&self, _target: &TargetThread, _deadline: Instant) -> WatchdogResult<()> {
        Ok(())
    }

    /// Get the target's attention for `fired`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target could not be reached. The fire is
    /// still pending and will be seen at the target's next checkpoint.
    fn deliver(&self, target: &TargetThread, fired: &WatchdogFired) -> WatchdogResult<()>;

    /// A pending cycle was disarmed.
    fn cancel(&self) {}

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Result of [`PendingInterrupt::post`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The mailbox was empty; the fire is now waiting.
    Posted,
    /// The fire is now waiting and displaced an unobserved one.
    Replaced(WatchdogFired),
    /// The fire belongs to a cycle that was already disarmed and was dropped.
    Discarded,
}

#[derive(Debug, Default)]
struct Slot {
    fired: Option<WatchdogFired>,
    /// Fires up to and including this generation are no longer wanted.
    discarded_through: Option<u64>,
}

/// One-slot mailbox holding the fire a target has not yet observed.
///
/// [`is_raised`](Self::is_raised) is a single atomic load so checkpoints in
/// hot loops stay cheap. `raised` is true exactly while the slot is full.
#[derive(Debug, Default)]
pub struct PendingInterrupt {
    raised: AtomicBool,
    slot: Mutex<Slot>,
}

impl PendingInterrupt {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a fire, replacing any unobserved one.
    ///
    /// A fire whose generation was already passed to
    /// [`discard_through`](Self::discard_through) is dropped: its cycle was
    /// disarmed while the timer thread was still on its way here.
    pub fn post(&self, fired: WatchdogFired) -> PostOutcome {
        let mut slot = self.slot.lock();
        if slot
            .discarded_through
            .is_some_and(|through| fired.generation <= through)
        {
            return PostOutcome::Discarded;
        }
        let previous = slot.fired.replace(fired);
        self.raised.store(true, Ordering::Release);
        previous.map_or(PostOutcome::Posted, PostOutcome::Replaced)
    }

    /// Whether a fire is waiting.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Look at the waiting fire without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<WatchdogFired> {
        if !self.is_raised() {
            return None;
        }
        self.slot.lock().fired
    }

    /// Consume the waiting fire if it was aimed at `thread`.
    pub fn take_for(&self, thread: ThreadId) -> Option<WatchdogFired> {
        if !self.is_raised() {
            return None;
        }
        let mut slot = self.slot.lock();
        match slot.fired {
            Some(fired) if fired.target == thread => self.empty(&mut slot),
            _ => None,
        }
    }

    /// Drop the waiting fire, and refuse later posts, for every generation up
    /// to and including `generation`.
    ///
    /// Returns the fire that was waiting, if any.
    pub fn discard_through(&self, generation: u64) -> Option<WatchdogFired> {
        let mut slot = self.slot.lock();
        slot.discarded_through = Some(
            slot.discarded_through
                .map_or(generation, |through| through.max(generation)),
        );
        self.empty(&mut slot)
    }

    /// Drop the waiting fire unless it was aimed at `thread`.
    ///
    /// Returns the fire that was dropped, if any.
    pub fn discard_unless_for(&self, thread: ThreadId) -> Option<WatchdogFired> {
        if !self.is_raised() {
            return None;
        }
        let mut slot = self.slot.lock();
        match slot.fired {
            Some(fired) if fired.target != thread => self.empty(&mut slot),
            _ => None,
        }
    }

    fn empty(&self, slot: &mut Slot) -> Option<WatchdogFired> {
        let fired = slot.fired.take();
        self.raised.store(false, Ordering::Release);
        fired
    }
}
