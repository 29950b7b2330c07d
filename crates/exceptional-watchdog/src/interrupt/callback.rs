//! Backend that hands the fire to the embedding host.
//!
//! Runtimes with their own interrupt primitive (a script engine's "request
//! interrupt", a VM's preemption flag) register it here; it runs on the timer
//! thread right after the fire is posted.

use std::fmt;

use crate::error::{WatchdogFired, WatchdogResult};
use crate::interrupt::InterruptDelivery;
use crate::target::TargetThread;

/// Callback function type for interrupt delivery.
pub type InterruptCallback = Box<dyn Fn(&TargetThread, &WatchdogFired) + Send + Sync>;

/// Invokes a host callback, then unparks the target.
pub struct CallbackDelivery {
    callback: InterruptCallback,
}

impl CallbackDelivery {
    /// Wrap `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&TargetThread, &WatchdogFired) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl InterruptDelivery for CallbackDelivery {
    fn deliver(&self, target: &TargetThread, fired: &WatchdogFired) -> WatchdogResult<()> {
        (self.callback)(target, fired);
        target.unpark();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "callback"
    }
}

impl fmt::Debug for CallbackDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDelivery").finish_non_exhaustive()
    }
}
