//! Platform thread handles and signal plumbing.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub(crate) use unix::{NativeThread, current_thread, install_handler, send_signal, signals_received};

#[cfg(not(unix))]
mod fallback;

#[cfg(not(unix))]
pub(crate) use fallback::{NativeThread, current_thread};
