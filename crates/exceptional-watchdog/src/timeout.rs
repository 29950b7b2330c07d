//! Validated feed durations.

use std::time::Duration;

use crate::error::{WatchdogError, WatchdogResult};

/// A positive, bounded duration accepted by `feed` and `arm`.
///
/// Hosts that hand over a millisecond count as a float (scripting runtimes
/// usually do) go through [`Timeout::from_millis_f64`], which truncates toward
/// zero the same way an `Int32` conversion would and rejects anything that
/// ends up non-positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout(Duration);

impl Timeout {
    /// Largest accepted timeout: `i32::MAX` milliseconds, about 24.8 days.
    pub const MAX: Self = Self(Duration::from_millis(2_147_483_647));

    /// Smallest accepted timeout.
    pub const MIN: Self = Self(Duration::from_millis(1));

    /// Build a timeout from a signed millisecond count.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidDuration`] if `millis` is zero,
    /// negative, or larger than [`Timeout::MAX`].
    pub fn from_millis(millis: i64) -> WatchdogResult<Self> {
        let Ok(positive) = u64::try_from(millis) else {
            return Err(WatchdogError::invalid_duration(format!(
                "must be positive, got {millis} ms"
            )));
        };
        Self::try_from(Duration::from_millis(positive))
    }

    /// Build a timeout from a floating point millisecond count.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidDuration`] if `millis` is NaN or
    /// infinite, truncates to less than one millisecond, or exceeds
    /// [`Timeout::MAX`].
    pub fn from_millis_f64(millis: f64) -> WatchdogResult<Self> {
        if !millis.is_finite() {
            return Err(WatchdogError::invalid_duration(format!(
                "must be finite, got {millis}"
            )));
        }
        let whole = millis.trunc();
        if whole < 1.0 {
            return Err(WatchdogError::invalid_duration(format!(
                "must be at least 1 ms, got {millis}"
            )));
        }
        if whole > 2_147_483_647.0 {
            return Err(WatchdogError::invalid_duration(format!(
                "must not exceed {} ms, got {millis}",
                Self::MAX.as_millis()
            )));
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "whole is an integral value in 1..=i32::MAX"
        )]
        let whole = whole as u64;
        Ok(Self(Duration::from_millis(whole)))
    }

    /// The timeout as a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// The timeout in whole milliseconds.
    #[must_use]
    pub fn as_millis(self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

impl TryFrom<Duration> for Timeout {
    type Error = WatchdogError;

    fn try_from(duration: Duration) -> WatchdogResult<Self> {
        if duration < Self::MIN.0 {
            return Err(WatchdogError::invalid_duration(format!(
                "must be at least 1 ms, got {duration:?}"
            )));
        }
        if duration > Self::MAX.0 {
            return Err(WatchdogError::invalid_duration(format!(
                "must not exceed {} ms, got {duration:?}",
                Self::MAX.as_millis()
            )));
        }
        Ok(Self(duration))
    }
}

impl From<Timeout> for Duration {
    fn from(timeout: Timeout) -> Self {
        timeout.0
    }
}

impl std::fmt::Display for Timeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ms", self.as_millis())
    }
}
