//! Default backend: rely on the pending-interrupt cell alone.

use crate::error::{WatchdogFired, WatchdogResult};
use crate::interrupt::InterruptDelivery;
use crate::target::TargetThread;

/// Interrupts are observed at the target's next checkpoint.
///
/// Unparks the target so a thread blocked in [`std::thread::park`] or
/// [`std::thread::park_timeout`] reaches its checkpoint right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafepointDelivery;

impl SafepointDelivery {
    /// Create the backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InterruptDelivery for SafepointDelivery {
    fn deliver(&self, target: &TargetThread, _fired: &WatchdogFired) -> WatchdogResult<()> {
        target.unpark();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "safepoint"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_deliver_unparks_target() -> Result<(), Box<dyn std::error::Error>> {
        let (tx, rx) = std::sync::mpsc::channel();
        let parked = thread::spawn(move || {
            let _sent = tx.send(TargetThread::current());
            let started = Instant::now();
            thread::park_timeout(Duration::from_secs(10));
            started.elapsed()
        });

        let target = rx.recv()?;
        let fired = WatchdogFired {
            generation: 1,
            timeout: Duration::from_millis(1),
            lateness: Duration::ZERO,
            target: target.id(),
        };
        SafepointDelivery::new().deliver(&target, &fired)?;

        let waited = parked.join().map_err(|_panic| "parked thread panicked")?;
        assert!(waited < Duration::from_secs(10));
        Ok(())
    }
}
