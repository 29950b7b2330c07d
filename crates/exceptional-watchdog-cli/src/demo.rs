//! The demo run: arm the process-wide watchdog, spin, get interrupted.

use exceptional_watchdog::global;
use exceptional_watchdog::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::CliError;

/// Interrupt delivery backend selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Observe the fire at the next checkpoint
    Safepoint,
    /// Also send a POSIX signal to the busy thread (unix only)
    Signal,
}

impl Backend {
    fn delivery(self) -> Result<Arc<dyn InterruptDelivery>, CliError> {
        match self {
            Self::Safepoint => Ok(Arc::new(SafepointDelivery::new())),
            #[cfg(unix)]
            Self::Signal => Ok(Arc::new(SignalDelivery::default())),
            #[cfg(not(unix))]
            Self::Signal => Err(CliError::ValidationError(
                "the signal backend is only available on unix".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub feed_ms: i64,
    pub busy_ms: u64,
    pub backend: Backend,
}

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub backend: &'static str,
    pub feed_ms: i64,
    pub busy_ms: u64,
    pub interrupted: bool,
    pub elapsed_ms: u64,
    pub iterations: u64,
    pub generation: u64,
    pub lateness_us: u64,
    /// Outcome of a second cycle that is disarmed straight after arming.
    pub rearm: DisarmOutcome,
    pub stats: WatchdogStats,
}

pub fn run(options: &DemoOptions) -> Result<DemoReport, CliError> {
    if options.busy_ms == 0 {
        return Err(CliError::ValidationError(
            "--busy-ms must be positive".to_string(),
        ));
    }

    let config = WatchdogConfig::builder()
        .thread_name("watchdog-demo-timer")
        .build()?;
    let watchdog = global::install(config, options.backend.delivery()?)?;

    let started = Instant::now();
    watchdog.feed(options.feed_ms)?;
    tracing::info!(
        feed_ms = options.feed_ms,
        busy_ms = options.busy_ms,
        backend = watchdog.delivery_name(),
        "Watchdog armed, entering busy loop"
    );

    let busy_for = Duration::from_millis(options.busy_ms);
    let mut iterations = 0_u64;
    let fired = loop {
        if started.elapsed() >= busy_for {
            break None;
        }
        let _metadata = std::fs::metadata(".");
        iterations = iterations.saturating_add(1);
        match watchdog.checkpoint() {
            Ok(()) => {}
            Err(WatchdogError::Fired(fired)) => break Some(fired),
            Err(other) => return Err(other.into()),
        }
    };
    let elapsed = started.elapsed();

    let Some(fired) = fired else {
        let outcome = watchdog.disarm();
        tracing::warn!(iterations, outcome = ?outcome, "Busy loop ran to completion");
        return Err(CliError::NotInterrupted {
            busy_ms: options.busy_ms,
        });
    };
    tracing::info!(iterations, generation = fired.generation, "Busy loop interrupted");

    let fired_outcome = watchdog.disarm();
    tracing::debug!(outcome = ?fired_outcome, "Disarmed after fire");

    watchdog.feed(options.feed_ms)?;
    let rearm = watchdog.disarm();

    Ok(DemoReport {
        backend: watchdog.delivery_name(),
        feed_ms: options.feed_ms,
        busy_ms: options.busy_ms,
        interrupted: true,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        iterations,
        generation: fired.generation,
        lateness_us: u64::try_from(fired.lateness.as_micros()).unwrap_or(u64::MAX),
        rearm,
        stats: watchdog.stats(),
    })
}
