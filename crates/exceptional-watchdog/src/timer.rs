//! Background timer thread.
//!
//! One per [`Watchdog`](crate::Watchdog). It blocks on the tracker's
//! condition variable until the current deadline (or forever while unarmed),
//! commits the fire, posts it, and hands it to the delivery backend.
//!
//! A panic anywhere in the loop (a host callback, for instance) ends the
//! thread and leaves the watchdog inert; the next feed respawns it when the
//! configuration allows. `parking_lot` locks do not poison, so the tracker
//! stays usable after such a fault.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use crate::deadline::Expired;
use crate::error::{WatchdogError, WatchdogFired, WatchdogResult};
use crate::interrupt::PostOutcome;
use crate::watchdog::Shared;

/// Spawn the timer thread for `shared`.
pub(crate) fn spawn(shared: Arc<Shared>) -> WatchdogResult<JoinHandle<()>> {
    let mut builder = thread::Builder::new().name(shared.config.thread_name.clone());
    if let Some(stack_size) = shared.config.stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder
        .spawn(move || run(&shared))
        .map_err(|error| WatchdogError::timer_spawn(error.to_string()))
}

fn run(shared: &Shared) {
    tracing::info!(
        backend = shared.delivery.name(),
        "Watchdog timer thread started"
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| timer_loop(shared)));
    shared.timer_running.store(false, Ordering::Release);
    if outcome.is_err() {
        shared.stats.record_timer_fault();
        tracing::error!(
            backend = shared.delivery.name(),
            "Watchdog timer thread faulted; no interrupt will fire until the next feed"
        );
    }
}

fn timer_loop(shared: &Shared) {
    while let Some(expired) = shared.tracker.wait_for_expiry() {
        fire(shared, expired);
    }
    tracing::debug!("Watchdog timer thread exiting");
}

fn fire(shared: &Shared, expired: Expired) {
    shared.stats.record_fire();

    let Some(target) = shared.target() else {
        tracing::warn!(
            generation = expired.generation,
            "Watchdog fired with no target thread registered"
        );
        shared.stats.record_fire_discarded();
        return;
    };

    let fired = WatchdogFired {
        generation: expired.generation,
        timeout: expired.timeout.as_duration(),
        lateness: expired.lateness,
        target: target.id(),
    };

    tracing::warn!(
        generation = fired.generation,
        timeout_ms = expired.timeout.as_millis(),
        lateness_us = u64::try_from(fired.lateness.as_micros()).unwrap_or(u64::MAX),
        target = ?target.id(),
        target_name = target.name().unwrap_or("<unnamed>"),
        "Watchdog not fed in time, interrupting target"
    );

    match shared.pending.post(fired) {
        PostOutcome::Posted => {}
        PostOutcome::Replaced(previous) => {
            shared.stats.record_fire_discarded();
            tracing::debug!(
                generation = previous.generation,
                "Unobserved watchdog fire replaced by a newer one"
            );
        }
        PostOutcome::Discarded => {
            shared.stats.record_fire_discarded();
            tracing::debug!(
                generation = fired.generation,
                "Watchdog was disarmed before the fire was posted"
            );
            return;
        }
    }

    // The target may have been replaced between the read above and the post.
    if let Some(current) = shared.target()
        && current.id() != fired.target
        && shared.pending.discard_unless_for(current.id()).is_some()
    {
        shared.stats.record_fire_discarded();
        tracing::debug!(
            generation = fired.generation,
            "Watchdog target changed while firing; fire dropped"
        );
        return;
    }

    if let Err(error) = shared.delivery.deliver(&target, &fired) {
        shared.stats.record_delivery_failure();
        tracing::warn!(
            error = %error,
            backend = shared.delivery.name(),
            "Interrupt delivery failed; the fire stays pending for the next checkpoint"
        );
    }
}
