//! Unix implementation: `pthread_kill` delivery and a minimal signal handler.

#![expect(unsafe_code, reason = "sigaction and pthread_kill are only reachable through libc")]

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

/// Signals taken by the interrupt handler, across all backends in the process.
static SIGNALS_RECEIVED: AtomicU64 = AtomicU64::new(0);

/// `pthread_t` of a registered target thread.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NativeThread(libc::pthread_t);

// SAFETY: a pthread_t is an opaque identifier; it is never dereferenced here,
// only handed back to pthread_kill.
unsafe impl Send for NativeThread {}

// SAFETY: see the Send impl; the value is never mutated after capture.
unsafe impl Sync for NativeThread {}

/// Handle for the calling thread.
pub(crate) fn current_thread() -> NativeThread {
    // SAFETY: pthread_self has no preconditions and cannot fail.
    let handle = unsafe { libc::pthread_self() };
    NativeThread(handle)
}

/// Number of interrupt signals handled so far.
pub(crate) fn signals_received() -> u64 {
    SIGNALS_RECEIVED.load(Ordering::Relaxed)
}

extern "C" fn on_interrupt_signal(_signal: libc::c_int) {
    // Lock-free atomics are async-signal-safe; errno is left untouched.
    SIGNALS_RECEIVED.fetch_add(1, Ordering::Relaxed);
}

/// Install the interrupt handler for `signal`.
///
/// Installed without `SA_RESTART`: blocking system calls on the target fail
/// with `EINTR` instead of resuming.
pub(crate) fn install_handler(signal: libc::c_int) -> io::Result<()> {
    // SAFETY: sigaction is plain old data; all-zero is a valid empty action.
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = on_interrupt_signal as *const () as libc::sighandler_t;
    action.sa_flags = 0;

    // SAFETY: sa_mask points to a sigset_t owned by `action`.
    let rc = unsafe { libc::sigemptyset(&raw mut action.sa_mask) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: `action` is fully initialised and its handler only touches an
    // atomic counter; the previous action is not requested.
    let rc = unsafe { libc::sigaction(signal, &raw const action, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Send `signal` to `thread`.
///
/// The caller must make sure the thread has not exited; a stale `pthread_t`
/// may have been reused.
pub(crate) fn send_signal(thread: NativeThread, signal: libc::c_int) -> io::Result<()> {
    // SAFETY: the caller checked the target's liveness flag, so the handle
    // still refers to a running thread.
    let rc = unsafe { libc::pthread_kill(thread.0, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_thread_is_stable() {
        let a = current_thread();
        let b = current_thread();
        // SAFETY: both handles come from pthread_self on this thread.
        let equal = unsafe { libc::pthread_equal(a.0, b.0) };
        assert_ne!(equal, 0);
    }

    #[test]
    fn test_invalid_signal_rejected() {
        assert!(install_handler(-1).is_err());
    }
}
