//! Error types for the watchdog.
//!
//! [`WatchdogError::Fired`] is the interruption itself: it is what a monitored
//! thread sees from [`Watchdog::checkpoint`](crate::Watchdog::checkpoint) once
//! the deadline has been missed. Every other variant is reported synchronously
//! to whoever made the failing call.

use std::thread::ThreadId;
use std::time::Duration;
use thiserror::Error;

/// Payload delivered to the target thread when the watchdog fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogFired {
    /// Arm cycle that expired.
    pub generation: u64,
    /// Timeout the cycle was armed with.
    pub timeout: Duration,
    /// How far past the deadline the timer thread committed the fire.
    pub lateness: Duration,
    /// Thread the interruption was aimed at.
    pub target: ThreadId,
}

impl std::fmt::Display for WatchdogFired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Watchdog was not fed within {:?} (generation {}, fired {:?} late)",
            self.timeout, self.generation, self.lateness
        )
    }
}

/// Errors that can occur during watchdog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchdogError {
    /// Feed or arm was given a duration that cannot be used as a deadline.
    #[error("Invalid watchdog duration: {reason}")]
    InvalidDuration {
        /// Why the duration was rejected.
        reason: String,
    },

    /// The deadline elapsed without a feed.
    #[error("{0}")]
    Fired(WatchdogFired),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operating system refused to start the timer thread.
    #[error("Failed to spawn watchdog timer thread: {0}")]
    TimerSpawn(String),

    /// The interrupt signal handler could not be installed.
    #[error("Failed to install interrupt signal handler: {0}")]
    SignalSetup(String),

    /// The delivery backend could not reach the target thread.
    #[error("Interrupt delivery failed: {0}")]
    DeliveryFailed(String),
}

impl WatchdogError {
    /// Create an invalid duration error.
    #[must_use]
    pub fn invalid_duration(reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a timer spawn error.
    #[must_use]
    pub fn timer_spawn(reason: impl Into<String>) -> Self {
        Self::TimerSpawn(reason.into())
    }

    /// Create a signal setup error.
    #[must_use]
    pub fn signal_setup(reason: impl Into<String>) -> Self {
        Self::SignalSetup(reason.into())
    }

    /// Create a delivery failed error.
    #[must_use]
    pub fn delivery_failed(reason: impl Into<String>) -> Self {
        Self::DeliveryFailed(reason.into())
    }

    /// Whether this error is the watchdog interruption.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        matches!(self, Self::Fired(_))
    }

    /// The interruption payload, if this error is one.
    #[must_use]
    pub fn fired(&self) -> Option<&WatchdogFired> {
        match self {
            Self::Fired(fired) => Some(fired),
            _ => None,
        }
    }
}

impl From<WatchdogFired> for WatchdogError {
    fn from(fired: WatchdogFired) -> Self {
        Self::Fired(fired)
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fired() -> WatchdogFired {
        WatchdogFired {
            generation: 7,
            timeout: Duration::from_millis(1000),
            lateness: Duration::from_micros(250),
            target: std::thread::current().id(),
        }
    }

    #[test]
    fn test_error_display() {
        let err = WatchdogError::invalid_duration("must be positive, got -3");
        assert!(err.to_string().contains("-3"));

        let err = WatchdogError::from(sample_fired());
        let text = err.to_string();
        assert!(text.contains("1s"));
        assert!(text.contains("generation 7"));
    }

    #[test]
    fn test_error_constructors() {
        let err = WatchdogError::invalid_configuration("thread_name must not be empty");
        assert!(matches!(err, WatchdogError::InvalidConfiguration(_)));

        let err = WatchdogError::signal_setup("EINVAL");
        assert!(matches!(err, WatchdogError::SignalSetup(_)));
        assert!(!err.is_fired());
        assert!(err.fired().is_none());
    }

    #[test]
    fn test_fired_accessors() {
        let fired = sample_fired();
        let err = WatchdogError::Fired(fired);
        assert!(err.is_fired());
        assert_eq!(err.fired(), Some(&fired));
    }
}
