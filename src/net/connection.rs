//! Connection workers and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Run the read → process → write cycle for one client
//! - Track live connections so shutdown can wake blocked workers
//! - Close each client socket exactly once
//!
//! # State Machine
//! ```text
//! Accepted → Reading → Processing → Writing → Reading ...
//!               │           │           │
//!               └───────────┴───────────┴──→ Closing → Closed
//! ```

use dashmap::DashMap;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ConnectionConfig;
use crate::handler::MessageHandler;
use crate::lifecycle::ShutdownSignal;
use crate::net::accept::Accepted;
use crate::net::buffer::{MessageBuffer, ReadOutcome};
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted but the worker has not started reading.
    Accepted,
    /// Blocked waiting for the next message.
    Reading,
    /// The handler is transforming the buffer.
    Processing,
    /// Writing the response back.
    Writing,
    /// Shutting the socket down.
    Closing,
    /// Socket released.
    Closed,
}

/// Why a worker stopped serving its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed the connection.
    PeerClosed,
    /// Reading from the socket failed.
    ReadError,
    /// The client sent more than the buffer holds.
    Oversized,
    /// The handler reported a response longer than the buffer.
    ResponseTooLarge,
    /// Writing the response failed.
    WriteError,
    /// Shutdown was requested.
    Shutdown,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::ReadError => "read_error",
            CloseReason::Oversized => "oversized",
            CloseReason::ResponseTooLarge => "response_too_large",
            CloseReason::WriteError => "write_error",
            CloseReason::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of live client connections.
///
/// Holds a second handle to each client socket. Workers are never joined;
/// the registry only lets the server shut sockets down so workers blocked in
/// a read wake up and exit.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, TcpStream>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live connection. Returns a guard that deregisters on drop.
    pub fn register(&self, id: ConnectionId, stream: &TcpStream) -> io::Result<RegistrationGuard> {
        self.connections.insert(id, stream.try_clone()?);
        Ok(RegistrationGuard {
            connections: Arc::clone(&self.connections),
            id,
        })
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Shut down every registered socket. Returns how many were signalled.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        for entry in self.connections.iter() {
            if let Err(e) = entry.value().shutdown(Shutdown::Both) {
                if e.kind() != io::ErrorKind::NotConnected {
                    tracing::debug!(connection_id = %entry.key(), error = %e, "Socket shutdown failed");
                }
            }
            closed += 1;
        }
        closed
    }
}

/// Guard that tracks a connection's registration.
/// Removes the registry entry when dropped.
#[derive(Debug)]
pub struct RegistrationGuard {
    connections: Arc<DashMap<ConnectionId, TcpStream>>,
    id: ConnectionId,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.connections.remove(&self.id);
        tracing::trace!(connection_id = %self.id, "Connection deregistered");
    }
}

/// Serves one client connection until it closes or shutdown is requested.
///
/// The worker owns its socket, its buffer and its registration outright;
/// nothing is shared with other workers except the handler and the shutdown
/// signal.
pub struct ConnectionWorker<H> {
    id: ConnectionId,
    peer_addr: SocketAddr,
    stream: TcpStream,
    buffer: MessageBuffer,
    handler: Arc<H>,
    shutdown: ShutdownSignal,
    state: ConnectionState,
    _registration: RegistrationGuard,
}

impl<H: MessageHandler> ConnectionWorker<H> {
    pub fn new(
        accepted: Accepted,
        handler: Arc<H>,
        shutdown: ShutdownSignal,
        registry: &ConnectionRegistry,
        config: &ConnectionConfig,
    ) -> io::Result<Self> {
        let Accepted { stream, peer_addr } = accepted;
        if config.nodelay {
            stream.set_nodelay(true)?;
        }

        let id = ConnectionId::new();
        let registration = registry.register(id, &stream)?;

        Ok(Self {
            id,
            peer_addr,
            stream,
            buffer: MessageBuffer::with_capacity(config.max_message_size),
            handler,
            shutdown,
            state: ConnectionState::Accepted,
            _registration: registration,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Serve the connection to completion, then close it.
    pub fn run(mut self) -> CloseReason {
        let span = tracing::debug_span!(
            "connection",
            connection_id = %self.id,
            peer_addr = %self.peer_addr
        );
        let _entered = span.enter();

        tracing::debug!("Worker started");
        metrics::connection_opened();

        let reason = self.serve();
        self.close(reason);
        reason
    }

    fn serve(&mut self) -> CloseReason {
        loop {
            if self.shutdown.is_triggered() {
                return CloseReason::Shutdown;
            }

            transition(&mut self.state, ConnectionState::Reading);
            let received = match self.buffer.read_from(&mut self.stream) {
                Ok(ReadOutcome::Message(n)) => n,
                Ok(ReadOutcome::Closed) => {
                    if self.shutdown.is_triggered() {
                        return CloseReason::Shutdown;
                    }
                    tracing::debug!("Client closed the connection");
                    return CloseReason::PeerClosed;
                }
                Ok(ReadOutcome::Oversized) => {
                    tracing::warn!(
                        max_message_size = self.buffer.capacity(),
                        "Message exceeds buffer capacity"
                    );
                    return CloseReason::Oversized;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if self.shutdown.is_triggered() {
                        return CloseReason::Shutdown;
                    }
                    tracing::error!(error = %e, "Failed to read from client");
                    return CloseReason::ReadError;
                }
            };

            transition(&mut self.state, ConnectionState::Processing);
            let started = Instant::now();
            let response_len = self
                .handler
                .process_message(self.buffer.as_mut_slice(), received);
            metrics::message_processed(started.elapsed());

            let Some(response) = self.buffer.response(response_len) else {
                tracing::error!(
                    response_len,
                    capacity = self.buffer.capacity(),
                    "Handler returned a response longer than the buffer"
                );
                return CloseReason::ResponseTooLarge;
            };

            transition(&mut self.state, ConnectionState::Writing);
            if let Err(e) = self.stream.write_all(response) {
                if self.shutdown.is_triggered() {
                    return CloseReason::Shutdown;
                }
                tracing::warn!(error = %e, response_len, "Failed to write response");
                return CloseReason::WriteError;
            }
            tracing::trace!(received, response_len, "Message processed");
        }
    }

    fn close(&mut self, reason: CloseReason) {
        transition(&mut self.state, ConnectionState::Closing);
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::debug!(error = %e, "Socket shutdown failed");
            }
        }
        transition(&mut self.state, ConnectionState::Closed);
        metrics::connection_closed(reason);
        tracing::debug!(reason = %reason, "Connection closed");
    }
}

fn transition(state: &mut ConnectionState, next: ConnectionState) {
    tracing::trace!(from = ?state, to = ?next, "Connection state change");
    *state = next;
}
