//! The waiter contract exercised through the public API.

use condwait::{infallible, ConditionWaiter, ManualClock, WaitConfig, WaitError, WaitSpec};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn counted<'a, F>(
    calls: &'a AtomicU32,
    mut check: F,
) -> impl FnMut() -> Result<bool, std::convert::Infallible> + 'a
where
    F: FnMut() -> bool + 'a,
{
    infallible(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        check()
    })
}

/// "webapp startup" flips at 350ms with a 100ms poll: false at 0, 100, 200,
/// 300 and true at 400.
#[test]
fn test_webapp_startup_scenario_exact() {
    let clock = Arc::new(ManualClock::new());
    let waiter = ConditionWaiter::with_clock(WaitConfig::default(), clock.clone());
    let calls = AtomicU32::new(0);

    let observed = clock.clone();
    let spec = WaitSpec::new(
        "webapp startup",
        counted(&calls, move || {
            observed.elapsed() >= Duration::from_millis(350)
        }),
    )
    .with_poll_interval(Duration::from_millis(100))
    .with_max_wait(Duration::from_millis(5000));

    waiter.wait(spec).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(clock.elapsed(), Duration::from_millis(400));
}

/// "server" never comes up: 500ms poll, 2000ms deadline.
#[test]
fn test_server_timeout_scenario_exact() {
    let clock = Arc::new(ManualClock::new());
    let waiter = ConditionWaiter::with_clock(WaitConfig::default(), clock.clone());

    let spec = WaitSpec::new("server", infallible(|| false))
        .with_poll_interval(Duration::from_millis(500))
        .with_max_wait(Duration::from_millis(2000));

    match waiter.wait(spec).unwrap_err() {
        WaitError::Timeout {
            label,
            elapsed,
            max_wait,
            attempts,
        } => {
            assert_eq!(label, "server");
            assert_eq!(elapsed, Duration::from_millis(2000));
            assert_eq!(max_wait, Duration::from_millis(2000));
            assert_eq!(attempts, 5);
        }
        other => panic!("Expected timeout, got {other:?}"),
    }
}

#[test]
fn test_webapp_startup_scenario_wall_clock() {
    let flag = Arc::new(AtomicBool::new(false));
    let listener = flag.clone();
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(350));
        listener.store(true, Ordering::SeqCst);
    });

    let observed = flag.clone();
    let spec = WaitSpec::new(
        "webapp startup",
        counted(&calls, move || observed.load(Ordering::SeqCst)),
    )
    .with_poll_interval(Duration::from_millis(100))
    .with_max_wait(Duration::from_millis(5000));

    ConditionWaiter::new().wait(spec).unwrap();
    let elapsed = start.elapsed();
    handle.join().unwrap();

    let calls = calls.load(Ordering::SeqCst);
    assert!((4..=5).contains(&calls), "unexpected evaluation count {calls}");
    assert!(elapsed >= Duration::from_millis(350));
    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
}

#[test]
fn test_server_timeout_scenario_wall_clock() {
    let spec = WaitSpec::new("server", infallible(|| false))
        .with_poll_interval(Duration::from_millis(500))
        .with_max_wait(Duration::from_millis(2000));

    let start = Instant::now();
    let err = ConditionWaiter::new().wait(spec).unwrap_err();
    let total = start.elapsed();

    match err {
        WaitError::Timeout { label, elapsed, .. } => {
            assert_eq!(label, "server");
            assert!(elapsed >= Duration::from_millis(2000));
            assert!(elapsed < Duration::from_millis(3000), "took {elapsed:?}");
        }
        other => panic!("Expected timeout, got {other:?}"),
    }
    assert!(total >= Duration::from_millis(2000));
}

#[test]
fn test_fault_on_first_evaluation_returns_immediately() {
    let calls = AtomicU32::new(0);
    let spec = WaitSpec::new("servlet startup", || {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<bool, _>(anyhow::anyhow!("listener service unavailable"))
    })
    .with_max_wait(Duration::from_secs(30));

    let start = Instant::now();
    let err = ConditionWaiter::new().wait(spec).unwrap_err();

    assert!(err.is_predicate_fault());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
}

/// Independent waits on separate threads do not interact.
#[test]
fn test_concurrent_waits_are_independent() {
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            std::thread::spawn(move || {
                let clock = ManualClock::new();
                let waiter = ConditionWaiter::with_clock(WaitConfig::default(), &clock);
                let ready_at = Duration::from_millis(100 * i);
                let spec = WaitSpec::new(
                    format!("component {i}"),
                    infallible(|| clock.elapsed() >= ready_at),
                )
                .with_poll_interval(Duration::from_millis(100))
                .with_max_wait(Duration::from_millis(200));

                (i, waiter.wait(spec))
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        if i <= 2 {
            assert!(result.is_ok(), "component {i} should be ready");
        } else {
            let err = result.unwrap_err();
            assert!(err.is_timeout());
            assert_eq!(err.label(), "component 3");
        }
    }
}
