//! Shutdown-aware accept loop.
//!
//! # Responsibilities
//! - Poll the non-blocking listener for new clients
//! - Hand accepted streams back in blocking mode
//! - Return promptly once shutdown is requested
//!
//! # Design Decisions
//! - Polling instead of an OS-level cancellable accept keeps the loop portable
//! - The wait between polls is interruptible, so shutdown latency is bounded
//!   by one poll interval and usually much less

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::lifecycle::ShutdownSignal;
use crate::net::listener::Listener;
use crate::observability::metrics;

/// A freshly accepted client connection.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer_addr: SocketAddr,
}

/// Block until a client connects or shutdown is requested.
///
/// Returns `None` once `shutdown` is triggered. Accept errors other than
/// would-block are logged and retried after the poll interval.
pub fn wait_for_client(
    listener: &Listener,
    shutdown: &ShutdownSignal,
    poll_interval: Duration,
) -> Option<Accepted> {
    tracing::trace!("Waiting for new client");

    while !shutdown.is_triggered() {
        match listener.try_accept() {
            Ok((stream, peer_addr)) => {
                if let Err(e) = stream.set_nonblocking(false) {
                    tracing::warn!(
                        peer_addr = %peer_addr,
                        error = %e,
                        "Failed to switch client socket to blocking mode, dropping it"
                    );
                    continue;
                }
                return Some(Accepted { stream, peer_addr });
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => {
                metrics::accept_error();
                tracing::warn!(error = %e, "Error accepting client");
            }
        }

        if shutdown.wait_timeout(poll_interval) {
            break;
        }
    }

    tracing::debug!("Accept loop observed shutdown");
    None
}
