//! Watchdog configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{WatchdogError, WatchdogResult};
use crate::timeout::Timeout;

/// Smallest stack the timer thread may be given.
pub const MIN_TIMER_STACK_SIZE: usize = 16 * 1024;

/// Watchdog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Name given to the timer thread.
    pub thread_name: String,
    /// Respawn the timer thread on the next feed if it died from a panic.
    pub restart_timer_on_fault: bool,
    /// Stack size for the timer thread (platform default when `None`).
    pub stack_size: Option<usize>,
    /// Longest timeout a feed may request.
    pub max_timeout: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            thread_name: "exceptional-watchdog".to_string(),
            restart_timer_on_fault: true,
            stack_size: None,
            max_timeout: Timeout::MAX.as_duration(),
        }
    }
}

impl WatchdogConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.thread_name.trim().is_empty() {
            return Err(WatchdogError::invalid_configuration(
                "thread_name must not be empty",
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(WatchdogError::invalid_configuration(
                "thread_name must not contain NUL bytes",
            ));
        }
        if let Some(stack_size) = self.stack_size
            && stack_size < MIN_TIMER_STACK_SIZE
        {
            return Err(WatchdogError::invalid_configuration(format!(
                "stack_size must be at least {MIN_TIMER_STACK_SIZE} bytes"
            )));
        }
        if Timeout::try_from(self.max_timeout).is_err() {
            return Err(WatchdogError::invalid_configuration(format!(
                "max_timeout must be between 1 ms and {}",
                Timeout::MAX
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the timer thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Enable or disable timer thread restarts after a fault.
    #[must_use]
    pub fn restart_timer_on_fault(mut self, enabled: bool) -> Self {
        self.config.restart_timer_on_fault = enabled;
        self
    }

    /// Set the timer thread stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    /// Set the longest timeout a feed may request.
    #[must_use]
    pub fn max_timeout(mut self, max: Duration) -> Self {
        self.config.max_timeout = max;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() -> WatchdogResult<()> {
        let config = WatchdogConfig::default();
        config.validate()?;
        assert!(config.restart_timer_on_fault);
        assert_eq!(config.max_timeout, Duration::from_millis(2_147_483_647));
        Ok(())
    }

    #[test]
    fn test_config_builder() -> WatchdogResult<()> {
        let config = WatchdogConfig::builder()
            .thread_name("doggo")
            .restart_timer_on_fault(false)
            .stack_size(64 * 1024)
            .max_timeout(Duration::from_secs(30))
            .build()?;

        assert_eq!(config.thread_name, "doggo");
        assert!(!config.restart_timer_on_fault);
        assert_eq!(config.stack_size, Some(64 * 1024));
        assert_eq!(config.max_timeout, Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn test_config_validation() {
        let config = WatchdogConfig {
            thread_name: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WatchdogConfig {
            stack_size: Some(1024),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WatchdogConfig {
            max_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WatchdogConfig {
            max_timeout: Duration::from_secs(60 * 60 * 24 * 365),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserialize_with_defaults() -> Result<(), serde_json::Error> {
        let config: WatchdogConfig =
            serde_json::from_str(r#"{ "thread_name": "from-json", "stack_size": 65536 }"#)?;
        assert_eq!(config.thread_name, "from-json");
        assert_eq!(config.stack_size, Some(65536));
        assert!(config.restart_timer_on_fault);
        assert_eq!(config.max_timeout, Timeout::MAX.as_duration());
        Ok(())
    }
}
