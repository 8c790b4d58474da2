//! Shutdown behaviour of the accept loop and connection workers.

use std::net::TcpStream;
use std::time::Duration;

mod common;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[test]
fn accept_loop_returns_within_one_poll_interval() {
    let server = common::start(conn_server::Echo);
    // let the accept loop settle into its poll wait
    std::thread::sleep(Duration::from_millis(250));

    let elapsed = server.stop();
    assert!(
        elapsed <= POLL_INTERVAL + Duration::from_millis(50),
        "accept loop took {elapsed:?} to stop"
    );
}

#[test]
fn no_connections_accepted_after_shutdown() {
    let server = common::start(conn_server::Echo);
    let addr = server.addr;
    server.stop();

    assert!(TcpStream::connect(addr).is_err());
}

#[test]
fn shutdown_wakes_idle_workers() {
    let server = common::start(conn_server::Echo);
    let mut client = server.connect();
    assert_eq!(common::round_trip(&mut client, b"hi", 2), b"hi");
    assert!(server.wait_for_connections(1, Duration::from_secs(2)));

    let connections = server.connections.clone();
    server.stop();

    assert!(common::is_closed_by_server(&mut client));
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while !connections.is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(connections.is_empty());
}

#[test]
fn without_close_on_shutdown_worker_exits_after_next_message() {
    let mut config = common::test_config();
    config.connection.close_on_shutdown = false;
    let server = common::start_with(config, conn_server::Echo);
    let mut client = server.connect();
    assert_eq!(common::round_trip(&mut client, b"first", 5), b"first");

    let connections = server.connections.clone();
    server.stop();

    // the worker is still blocked in its read
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(connections.len(), 1);

    // the in-flight message is still answered, then shutdown is observed
    assert_eq!(common::round_trip(&mut client, b"late", 4), b"late");
    assert!(common::is_closed_by_server(&mut client));
}
