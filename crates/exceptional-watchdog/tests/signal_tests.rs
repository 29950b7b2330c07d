//! Signal delivery tests.

#![cfg(unix)]

use exceptional_watchdog::prelude::*;
use std::io::{ErrorKind, Read};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn signal_watchdog() -> WatchdogResult<Watchdog> {
    Watchdog::new(WatchdogConfig::default(), Arc::new(SignalDelivery::default()))
}

#[test]
fn test_signal_breaks_blocking_read() -> TestResult {
    let (mut reader, _writer) = UnixStream::pair()?;
    reader.set_read_timeout(Some(Duration::from_secs(5)))?;

    let watchdog = signal_watchdog()?;
    assert_eq!(watchdog.delivery_name(), "signal");
    let before = SignalDelivery::signals_received();

    let started = Instant::now();
    watchdog.feed(100)?;

    let mut buf = [0_u8; 16];
    let error = reader
        .read(&mut buf)
        .err()
        .ok_or("read returned without data")?;
    let elapsed = started.elapsed();

    assert_eq!(error.kind(), ErrorKind::Interrupted);
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(4), "read ran to its timeout");
    assert!(SignalDelivery::signals_received() > before);

    let fired = watchdog.checkpoint().err().ok_or("fire not posted")?;
    assert!(fired.is_fired());
    assert_eq!(watchdog.stats().delivery_failures, 0);
    Ok(())
}

#[test]
fn test_signal_to_exited_target_fails_delivery() -> TestResult {
    let target = thread::spawn(TargetThread::current)
        .join()
        .map_err(|_panic| "target thread panicked")?;
    assert!(!target.is_alive());

    let watchdog = signal_watchdog()?;
    watchdog.arm_for(target, 20)?;

    let started = Instant::now();
    while watchdog.stats().delivery_failures == 0 && started.elapsed() < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(5));
    }

    let stats = watchdog.stats();
    assert_eq!(stats.fires, 1);
    assert_eq!(stats.delivery_failures, 1);
    assert_eq!(stats.unobserved_fires(), 1);
    Ok(())
}

#[test]
fn test_signal_backend_rejects_reserved_signals() {
    assert!(matches!(
        SignalDelivery::new(libc::SIGKILL),
        Err(WatchdogError::InvalidConfiguration(_))
    ));
}
