//! Prelude for exceptional-watchdog.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use exceptional_watchdog::prelude::*;
//!
//! let watchdog = Watchdog::default();
//! watchdog.feed(5_000)?;
//! watchdog.checkpoint()?;
//! assert_eq!(watchdog.disarm(), DisarmOutcome::Disarmed { generation: 1 });
//! # Ok::<(), WatchdogError>(())
//! ```

pub use crate::config::{WatchdogConfig, WatchdogConfigBuilder};
pub use crate::error::{WatchdogError, WatchdogFired, WatchdogResult};
#[cfg(unix)]
pub use crate::interrupt::SignalDelivery;
pub use crate::interrupt::{CallbackDelivery, InterruptDelivery, SafepointDelivery};
pub use crate::state::{DisarmOutcome, WatchdogStatus};
pub use crate::stats::WatchdogStats;
pub use crate::target::TargetThread;
pub use crate::timeout::Timeout;
pub use crate::watchdog::Watchdog;
