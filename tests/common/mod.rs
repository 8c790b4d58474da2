//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use conn_server::net::ConnectionRegistry;
use conn_server::{MessageHandler, Server, ServerConfig, ShutdownSignal};

/// A server running on a background thread, bound to an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: ShutdownSignal,
    pub connections: ConnectionRegistry,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Trigger shutdown and wait for the accept loop to return.
    /// Returns how long the accept loop took to exit.
    pub fn stop(mut self) -> Duration {
        let start = Instant::now();
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
        start.elapsed()
    }

    /// Poll until the registry holds `expected` connections.
    pub fn wait_for_connections(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.connections.len() == expected {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        self.connections.len() == expected
    }

    pub fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Loopback configuration on an ephemeral port.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::with_port(0);
    config.listener.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config
}

pub fn start<H: MessageHandler>(handler: H) -> TestServer {
    start_with(test_config(), handler)
}

pub fn start_with<H: MessageHandler>(config: ServerConfig, handler: H) -> TestServer {
    let shutdown = ShutdownSignal::new();
    let server = Server::bind(config, handler, shutdown.clone()).unwrap();
    let addr = server.local_addr();
    let connections = server.connections();
    let handle = thread::spawn(move || server.run());

    TestServer {
        addr,
        shutdown,
        connections,
        handle: Some(handle),
    }
}

/// Handler that records every message it sees and echoes it back.
#[derive(Clone, Default)]
pub struct Recorder {
    pub calls: Arc<AtomicUsize>,
    pub messages: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Recorder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().unwrap().clone()
    }
}

impl MessageHandler for Recorder {
    fn process_message(&self, buffer: &mut [u8], received: usize) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(buffer[..received].to_vec());
        received
    }
}

/// Send `message` and read exactly `expected_len` response bytes.
pub fn round_trip(stream: &mut TcpStream, message: &[u8], expected_len: usize) -> Vec<u8> {
    stream.write_all(message).unwrap();
    let mut response = vec![0u8; expected_len];
    stream.read_exact(&mut response).unwrap();
    response
}

/// True once the server has closed `stream` (EOF or reset).
pub fn is_closed_by_server(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 64];
    match stream.read(&mut buf) {
        Ok(0) => true,
        Ok(_) => false,
        Err(e) => !matches!(
            e.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ),
    }
}
