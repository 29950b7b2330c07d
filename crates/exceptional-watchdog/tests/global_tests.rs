//! Tests for the process-wide watchdog.
//!
//! Everything lives in one test: the instance is shared by the whole binary.

use exceptional_watchdog::global;
use exceptional_watchdog::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_global_watchdog_lifecycle() -> TestResult {
    assert!(!global::is_initialized());

    let config = WatchdogConfig::builder()
        .thread_name("global-watchdog-test")
        .build()?;
    let installed = global::install(config.clone(), Arc::new(SafepointDelivery::new()))?;
    assert_eq!(installed.config().thread_name, "global-watchdog-test");
    assert!(global::is_initialized());

    let second = global::install(config, Arc::new(SafepointDelivery::new()));
    assert!(matches!(
        second,
        Err(WatchdogError::InvalidConfiguration(_))
    ));
    assert!(std::ptr::eq(installed, global::global()));

    assert!(global::feed(0).is_err());
    assert_eq!(global::status(), WatchdogStatus::Unarmed);

    global::arm(10_000)?;
    assert_eq!(global::disarm(), DisarmOutcome::Disarmed { generation: 1 });

    global::feed(25)?;
    let started = Instant::now();
    let error = loop {
        if let Err(error) = global::checkpoint() {
            break error;
        }
        if started.elapsed() > Duration::from_secs(2) {
            return Err("process-wide watchdog did not fire".into());
        }
        thread::park_timeout(Duration::from_millis(1));
    };

    assert!(error.is_fired());
    assert_eq!(global::disarm(), DisarmOutcome::AlreadyFired { generation: 2 });

    let stats = global::stats();
    assert_eq!(stats.feeds, 2);
    assert_eq!(stats.rejected_feeds, 1);
    assert_eq!(stats.fires, 1);
    assert_eq!(stats.unobserved_fires(), 0);
    Ok(())
}
