//! Process-wide watchdog.
//!
//! The first use of [`global`] (or any helper here) creates one [`Watchdog`]
//! with the default configuration and [`SafepointDelivery`](crate::SafepointDelivery).
//! Call [`install`] before that to pick a different configuration or backend.
//!
//! ```rust
//! use exceptional_watchdog::global;
//!
//! global::feed(60_000)?;
//! // ... work, calling global::checkpoint()? in loops ...
//! global::checkpoint()?;
//! global::disarm();
//! # Ok::<(), exceptional_watchdog::WatchdogError>(())
//! ```

use std::sync::{Arc, OnceLock};

use crate::config::WatchdogConfig;
use crate::error::{WatchdogError, WatchdogResult};
use crate::interrupt::InterruptDelivery;
use crate::state::{DisarmOutcome, WatchdogStatus};
use crate::stats::WatchdogStats;
use crate::watchdog::Watchdog;

static GLOBAL: OnceLock<Watchdog> = OnceLock::new();

/// The process-wide watchdog, created on first use.
pub fn global() -> &'static Watchdog {
    GLOBAL.get_or_init(Watchdog::default)
}

/// Whether the process-wide watchdog has been created.
#[must_use]
pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

/// Create the process-wide watchdog with `config` and `delivery`.
///
/// # Errors
///
/// Returns [`WatchdogError::InvalidConfiguration`] if the configuration is
/// invalid or the process-wide watchdog already exists.
pub fn install(
    config: WatchdogConfig,
    delivery: Arc<dyn InterruptDelivery>,
) -> WatchdogResult<&'static Watchdog> {
    let watchdog = Watchdog::new(config, delivery)?;
    GLOBAL.set(watchdog).map_err(|_rejected| {
        WatchdogError::invalid_configuration("process-wide watchdog is already initialized")
    })?;
    tracing::info!("Process-wide watchdog installed");
    Ok(global())
}

/// Feed the process-wide watchdog. See [`Watchdog::feed`].
///
/// # Errors
///
/// See [`Watchdog::feed`].
pub fn feed(millis: i64) -> WatchdogResult<()> {
    global().feed(millis)
}

/// Arm the process-wide watchdog. See [`Watchdog::arm`].
///
/// # Errors
///
/// See [`Watchdog::feed`].
pub fn arm(millis: i64) -> WatchdogResult<()> {
    global().arm(millis)
}

/// Disarm the process-wide watchdog. See [`Watchdog::disarm`].
pub fn disarm() -> DisarmOutcome {
    global().disarm()
}

/// Safepoint on the process-wide watchdog. See [`Watchdog::checkpoint`].
///
/// # Errors
///
/// Returns [`WatchdogError::Fired`] when the watchdog fired for this thread.
#[inline]
pub fn checkpoint() -> WatchdogResult<()> {
    global().checkpoint()
}

/// Status of the process-wide watchdog.
pub fn status() -> WatchdogStatus {
    global().status()
}

/// Counters of the process-wide watchdog.
pub fn stats() -> WatchdogStats {
    global().stats()
}
