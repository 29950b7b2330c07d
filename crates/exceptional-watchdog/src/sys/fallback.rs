//! Fallback for platforms without POSIX signals.
//!
//! Only the safepoint and callback backends are available here.

/// Placeholder native handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NativeThread;

/// Handle for the calling thread.
pub(crate) fn current_thread() -> NativeThread {
    NativeThread
}
