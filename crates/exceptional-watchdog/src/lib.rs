//! # exceptional-watchdog
//!
//! Watchdog timer that interrupts a monitored thread when it is not fed in time.
//!
//! A program arms the watchdog with a timeout and keeps feeding it while it
//! makes progress. If a deadline passes without a feed, a background timer
//! thread fires: it posts the fire for the target thread and asks the
//! configured delivery backend to get the target's attention. The target
//! observes the fire at [`Watchdog::checkpoint`] as an ordinary
//! [`WatchdogError::Fired`], which unwinds its work through `?`.
//!
//! ## Architecture
//!
//! - [`watchdog`] - The [`Watchdog`] handle: feed, disarm, checkpoint
//! - [`global`] - Process-wide instance and free-function helpers
//! - [`deadline`] - Mutex/condvar deadline tracker with fire generations
//! - [`interrupt`] - Pending-interrupt cell and delivery backends
//! - [`target`] - Handle to the thread being watched
//! - [`timeout`] - Validated feed durations
//! - [`config`] - Timer thread configuration
//! - [`state`] - Status and disarm outcomes
//! - [`stats`] - Counters
//! - [`error`] - Watchdog-specific error types
//!
//! ## Guarantees
//!
//! - **At most one fire per arming**: re-arming is the only way to fire again
//! - **Last feed wins**: every feed supersedes the previous deadline
//! - **No lost disarm**: a disarm either cancels the deadline or reports that
//!   the fire already happened
//! - **Never early**: a fire commits no sooner than its deadline
//!
//! ## Example
//!
//! ```rust
//! use exceptional_watchdog::prelude::*;
//! use std::time::Duration;
//!
//! let watchdog = Watchdog::default();
//! watchdog.feed(20)?;
//!
//! let outcome = loop {
//!     // Each unit of work ends at a safepoint.
//!     if let Err(error) = watchdog.checkpoint() {
//!         break error;
//!     }
//!     std::thread::park_timeout(Duration::from_millis(1));
//! };
//!
//! assert!(outcome.is_fired());
//! assert_eq!(watchdog.status(), WatchdogStatus::Fired);
//! # Ok::<(), WatchdogError>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod deadline;
pub mod error;
pub mod global;
pub mod interrupt;
pub mod state;
pub mod stats;
pub mod target;
pub mod timeout;
pub mod watchdog;

pub mod prelude;

mod sys;
mod timer;

pub use config::{WatchdogConfig, WatchdogConfigBuilder};
pub use error::{WatchdogError, WatchdogFired, WatchdogResult};
#[cfg(unix)]
pub use interrupt::SignalDelivery;
pub use interrupt::{
    CallbackDelivery, InterruptCallback, InterruptDelivery, PendingInterrupt, PostOutcome,
    SafepointDelivery,
};
pub use state::{DisarmOutcome, WatchdogStatus};
pub use stats::WatchdogStats;
pub use target::TargetThread;
pub use timeout::Timeout;
pub use watchdog::Watchdog;
