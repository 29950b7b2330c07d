//! Handle to the thread the watchdog interrupts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread, ThreadId};

use crate::sys::{self, NativeThread};

/// Cleared by the thread-local destructor when the owning thread exits.
struct Liveness(Arc<AtomicBool>);

impl Drop for Liveness {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

thread_local! {
    static LIVENESS: Liveness = Liveness(Arc::new(AtomicBool::new(true)));
}

/// A thread that can be interrupted by the watchdog.
///
/// Captured on the thread itself with [`TargetThread::current`]. Besides the
/// std [`Thread`] handle (used to unpark it) this records the native handle
/// signal delivery needs and a liveness flag that flips when the thread
/// exits, so a stale handle is never signalled.
#[derive(Debug, Clone)]
pub struct TargetThread {
    thread: Thread,
    native: NativeThread,
    alive: Arc<AtomicBool>,
}

impl TargetThread {
    /// Capture the calling thread.
    #[must_use]
    pub fn current() -> Self {
        let alive = LIVENESS
            .try_with(|liveness| Arc::clone(&liveness.0))
            .unwrap_or_else(|_destroyed| Arc::new(AtomicBool::new(false)));
        Self {
            thread: thread::current(),
            native: sys::current_thread(),
            alive,
        }
    }

    /// Identifier of the target thread.
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.thread.id()
    }

    /// Name of the target thread, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.thread.name()
    }

    /// Whether the target thread is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Whether this handle refers to the calling thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.id() == thread::current().id()
    }

    /// Wake the target if it is blocked in [`std::thread::park`].
    pub fn unpark(&self) {
        self.thread.unpark();
    }

    pub(crate) fn native(&self) -> NativeThread {
        self.native
    }
}

impl PartialEq for TargetThread {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for TargetThread {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_thread_identity() {
        let target = TargetThread::current();
        assert_eq!(target.id(), thread::current().id());
        assert!(target.is_current());
        assert!(target.is_alive());
        assert_eq!(target, TargetThread::current());
    }

    #[test]
    fn test_liveness_cleared_on_exit() -> Result<(), Box<dyn std::error::Error>> {
        let target = thread::Builder::new()
            .name("short-lived".to_string())
            .spawn(TargetThread::current)?
            .join()
            .map_err(|_panic| "target thread panicked")?;

        assert_eq!(target.name(), Some("short-lived"));
        assert!(!target.is_current());
        assert!(!target.is_alive());
        Ok(())
    }
}
