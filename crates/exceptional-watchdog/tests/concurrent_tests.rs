//! Concurrency tests for the watchdog.

use exceptional_watchdog::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_concurrent_feeds_last_wins() -> TestResult {
    let watchdog = Arc::new(Watchdog::default());
    watchdog.feed(60_000)?;
    let mut handles = vec![];

    for _ in 0..8 {
        let watchdog_clone = Arc::clone(&watchdog);
        let handle = thread::spawn(move || -> WatchdogResult<()> {
            for _ in 0..1_000 {
                watchdog_clone.feed(60_000)?;
            }
            Ok(())
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().map_err(|_panic| "feeder panicked")??;
    }

    let snapshot = watchdog.snapshot();
    assert_eq!(snapshot.generation, 8_001);
    assert_eq!(snapshot.status, WatchdogStatus::Armed);
    assert_eq!(watchdog.stats().feeds, 8_001);
    assert_eq!(watchdog.stats().fires, 0);
    assert_eq!(
        watchdog.disarm(),
        DisarmOutcome::Disarmed { generation: 8_001 }
    );
    Ok(())
}

#[test]
fn test_disarm_racing_fire_is_never_lost() -> TestResult {
    let watchdog = Watchdog::default();
    let mut already_fired = 0_u64;

    for round in 0..200_u64 {
        watchdog.feed(1)?;
        if round % 2 == 0 {
            thread::sleep(Duration::from_micros(900));
        }
        match watchdog.disarm() {
            DisarmOutcome::Disarmed { generation } | DisarmOutcome::AlreadyFired { generation }
                if generation != round + 1 =>
            {
                return Err(format!("round {round} reported generation {generation}").into());
            }
            DisarmOutcome::AlreadyFired { .. } => already_fired += 1,
            DisarmOutcome::Disarmed { .. } => {}
            DisarmOutcome::NotArmed => return Err("armed watchdog reported NotArmed".into()),
        }
    }

    // The fire counter is bumped just after the commit; give it a moment.
    let started = Instant::now();
    while watchdog.stats().fires != already_fired && started.elapsed() < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(5));
    }

    let stats = watchdog.stats();
    assert_eq!(stats.fires, already_fired);
    assert_eq!(stats.disarms, 200 - already_fired);
    assert_eq!(watchdog.status(), WatchdogStatus::Unarmed);
    Ok(())
}

#[test]
fn test_non_target_checkpoints_never_consume() -> TestResult {
    let watchdog = Arc::new(Watchdog::default());
    watchdog.feed(20)?;
    let mut handles = vec![];

    for _ in 0..4 {
        let watchdog_clone = Arc::clone(&watchdog);
        let handle = thread::spawn(move || -> WatchdogResult<()> {
            let started = Instant::now();
            while started.elapsed() < Duration::from_millis(300) {
                watchdog_clone.checkpoint()?;
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().map_err(|_panic| "observer panicked")??;
    }

    let error = watchdog
        .checkpoint()
        .err()
        .ok_or("fire was lost or consumed elsewhere")?;
    assert!(error.is_fired());
    assert_eq!(watchdog.stats().interrupts_observed, 1);
    Ok(())
}

#[test]
fn test_concurrent_status_reads() -> TestResult {
    let watchdog = Arc::new(Watchdog::default());
    watchdog.feed(60_000)?;
    let mut handles = vec![];

    for _ in 0..4 {
        let watchdog_clone = Arc::clone(&watchdog);
        let handle = thread::spawn(move || {
            for _ in 0..1_000 {
                let snapshot = watchdog_clone.snapshot();
                assert!(snapshot.generation >= 1);
                let _stats = watchdog_clone.stats();
                let _remaining = watchdog_clone.time_remaining();
            }
        });
        handles.push(handle);
    }

    for _ in 0..100 {
        watchdog.feed(60_000)?;
    }

    for handle in handles {
        assert!(handle.join().is_ok(), "Thread should not panic");
    }
    assert_eq!(watchdog.snapshot().generation, 101);
    Ok(())
}

#[test]
fn test_independent_watchdogs_do_not_interfere() -> TestResult {
    let short = Watchdog::default();
    let long = Watchdog::default();
    short.feed(20)?;
    long.feed(60_000)?;

    let started = Instant::now();
    let fired = loop {
        if let Err(error) = short.checkpoint() {
            break error;
        }
        long.checkpoint()?;
        if started.elapsed() > Duration::from_secs(2) {
            return Err("short watchdog did not fire".into());
        }
        thread::park_timeout(Duration::from_millis(1));
    };

    assert!(fired.is_fired());
    assert_eq!(long.status(), WatchdogStatus::Armed);
    long.checkpoint()?;
    Ok(())
}
