//! Waits driven by real sockets, HTTP servers and files.

use condwait::{
    file_exists, tcp_reachable, wait_async, AsyncHttpProbe, ConditionWaiter, HttpProbe,
    WaitConfig, WaitSpec,
};
use std::net::TcpListener;
use std::time::Duration;

use crate::common::{find_available_port, spawn_status_server};

fn fast_waiter() -> ConditionWaiter {
    ConditionWaiter::with_config(WaitConfig {
        poll_interval_ms: 20,
        max_wait_ms: 3000,
    })
}

#[test]
fn test_wait_for_port_that_opens_later() {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        // Keep the listener open long enough for the waiter to see it
        std::thread::sleep(Duration::from_millis(500));
        drop(listener);
    });

    let waiter = fast_waiter();
    waiter
        .wait(waiter.spec("server", || {
            tcp_reachable(&addr, Duration::from_millis(200))
        }))
        .unwrap();

    handle.join().unwrap();
}

#[test]
fn test_closed_port_times_out() {
    let addr = format!("127.0.0.1:{}", find_available_port());
    let spec = WaitSpec::new("server", || tcp_reachable(&addr, Duration::from_millis(50)))
        .with_poll_interval(Duration::from_millis(20))
        .with_max_wait(Duration::from_millis(100));

    let err = ConditionWaiter::new().wait(spec).unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn test_unresolvable_address_is_a_fault() {
    let spec = WaitSpec::new("server", || {
        tcp_reachable("missing-port", Duration::from_millis(50))
    })
    .with_max_wait(Duration::from_secs(10));

    let err = ConditionWaiter::new().wait(spec).unwrap_err();
    assert!(err.is_predicate_fault());
}

#[test]
fn test_wait_for_http_server_recovery() {
    let base = spawn_status_server(vec![503, 503, 404, 200]);
    let probe = HttpProbe::new(base, Duration::from_secs(1)).unwrap();

    let waiter = fast_waiter();
    waiter
        .wait(waiter.spec("server", || probe.check_server("/helloworld/hs")))
        .unwrap();
}

#[test]
fn test_wait_for_file() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("deployed.marker");

    let writer_path = marker.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(60));
        std::fs::write(writer_path, b"ok").unwrap();
    });

    let waiter = fast_waiter();
    waiter
        .wait(waiter.spec("webapp startup", || file_exists(&marker)))
        .unwrap();
    handle.join().unwrap();
}

#[tokio::test]
async fn test_async_wait_for_http_server() {
    let base = spawn_status_server(vec![503, 200]);
    let probe = AsyncHttpProbe::new(base, Duration::from_secs(1)).unwrap();

    let spec = WaitSpec::new("server", || probe.check_server("/"))
        .with_poll_interval(Duration::from_millis(20))
        .with_max_wait(Duration::from_secs(3));

    wait_async(spec).await.unwrap();
}
