//! POSIX signal backend.

use std::sync::OnceLock;
use std::time::Instant;

use crate::error::{WatchdogError, WatchdogFired, WatchdogResult};
use crate::interrupt::InterruptDelivery;
use crate::sys;
use crate::target::TargetThread;

/// Signals that report synchronous faults or cannot be caught.
const RESERVED_SIGNALS: [libc::c_int; 7] = [
    libc::SIGKILL,
    libc::SIGSTOP,
    libc::SIGSEGV,
    libc::SIGBUS,
    libc::SIGFPE,
    libc::SIGILL,
    libc::SIGABRT,
];

/// Sends a signal to the target with `pthread_kill`.
///
/// The handler is installed lazily on the first feed, process-wide, without
/// `SA_RESTART`. A target blocked in `read`, `accept`, `nanosleep` and
/// similar calls gets `EINTR` (`ErrorKind::Interrupted`) back and can reach
/// its checkpoint; a target running pure computation sees the fire at its
/// next checkpoint as with [`SafepointDelivery`](super::SafepointDelivery).
///
/// Rust's `std::thread::sleep` retries on `EINTR`; use `park_timeout` for
/// interruptible waits.
#[derive(Debug)]
pub struct SignalDelivery {
    signal: libc::c_int,
    installed: OnceLock<Result<(), String>>,
}

impl SignalDelivery {
    /// Default signal used for interruption.
    pub const DEFAULT_SIGNAL: libc::c_int = libc::SIGUSR2;

    /// Create a backend that signals with `signal`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidConfiguration`] for non-positive
    /// signal numbers and for signals reserved for faults or that cannot be
    /// caught.
    pub fn new(signal: libc::c_int) -> WatchdogResult<Self> {
        if signal <= 0 || RESERVED_SIGNALS.contains(&signal) {
            return Err(WatchdogError::invalid_configuration(format!(
                "signal {signal} cannot be used for watchdog interrupts"
            )));
        }
        Ok(Self {
            signal,
            installed: OnceLock::new(),
        })
    }

    /// Signal number used by this backend.
    #[must_use]
    pub fn signal(&self) -> libc::c_int {
        self.signal
    }

    /// Interrupt signals handled so far by this process.
    #[must_use]
    pub fn signals_received() -> u64 {
        sys::signals_received()
    }

    fn ensure_installed(&self) -> WatchdogResult<()> {
        let installed = self.installed.get_or_init(|| {
            sys::install_handler(self.signal).map_err(|error| error.to_string())?;
            tracing::debug!(signal = self.signal, "Watchdog interrupt handler installed");
            Ok(())
        });
        installed.clone().map_err(WatchdogError::signal_setup)
    }
}

impl Default for SignalDelivery {
    fn default() -> Self {
        Self {
            signal: Self::DEFAULT_SIGNAL,
            installed: OnceLock::new(),
        }
    }
}

impl InterruptDelivery for SignalDelivery {
    fn arm(&self, _target: &TargetThread, _deadline: Instant) -> WatchdogResult<()> {
        self.ensure_installed()
    }

    fn deliver(&self, target: &TargetThread, _fired: &WatchdogFired) -> WatchdogResult<()> {
        target.unpark();
        if !target.is_alive() {
            return Err(WatchdogError::delivery_failed(format!(
                "target thread {:?} has exited",
                target.id()
            )));
        }
        self.ensure_installed()?;
        sys::send_signal(target.native(), self.signal)
            .map_err(|error| WatchdogError::delivery_failed(error.to_string()))
    }

    fn name(&self) -> &'static str {
        "signal"
    }
}
