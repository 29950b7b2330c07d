//! Error types for watchdog-demo

use exceptional_watchdog::WatchdogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Watchdog did not interrupt the busy loop within {busy_ms} ms")]
    NotInterrupted { busy_ms: u64 },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Watchdog error: {0}")]
    Watchdog(#[from] WatchdogError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotInterrupted { .. } => 2,
            Self::ValidationError(_)
            | Self::Watchdog(
                WatchdogError::InvalidDuration { .. } | WatchdogError::InvalidConfiguration(_),
            ) => 4,
            Self::Watchdog(_) | Self::JsonError(_) => 1,
        }
    }
}
