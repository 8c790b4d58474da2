//! Listening socket creation.
//!
//! # Responsibilities
//! - Create a TCP stream socket for the configured address
//! - Enable address reuse and non-blocking mode
//! - Bind and listen with a fixed backlog
//! - Report failures as typed errors instead of a sentinel handle

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use thiserror::Error;

use crate::config::ListenerConfig;

/// Error type for listener creation.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The OS refused to create a socket.
    #[error("Failed to create socket: {0}")]
    Create(#[source] io::Error),

    /// A socket option could not be applied.
    #[error("Failed to configure socket ({option}): {source}")]
    Configure {
        option: &'static str,
        #[source]
        source: io::Error,
    },

    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Failed to start listening.
    #[error("Failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// The server's single listening socket.
///
/// The socket is non-blocking so the accept loop can poll it between
/// shutdown checks. It is closed exactly once, by [`Listener::close`] or on
/// drop.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Create, configure, bind and start listening.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr = config.socket_addr();
        match create_listener(addr, config.backlog) {
            Ok(listener) => {
                tracing::info!(
                    address = %listener.local_addr,
                    backlog = config.backlog,
                    "Listening for connections"
                );
                Ok(listener)
            }
            Err(e) => {
                tracing::error!(address = %addr, error = %e, "Failed to create listening socket");
                Err(e)
            }
        }
    }

    /// Attempt a single non-blocking accept.
    ///
    /// Returns `ErrorKind::WouldBlock` when no client is waiting.
    pub fn try_accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.inner.accept()
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listening socket.
    pub fn close(self) {
        tracing::debug!(address = %self.local_addr, "Closing listening socket");
        drop(self.inner);
    }
}

fn create_listener(addr: SocketAddr, backlog: i32) -> Result<Listener, ListenerError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(ListenerError::Create)?;

    socket
        .set_reuse_address(true)
        .map_err(|source| ListenerError::Configure {
            option: "SO_REUSEADDR",
            source,
        })?;
    socket
        .set_nonblocking(true)
        .map_err(|source| ListenerError::Configure {
            option: "O_NONBLOCK",
            source,
        })?;

    socket
        .bind(&addr.into())
        .map_err(|source| ListenerError::Bind { addr, source })?;
    socket
        .listen(backlog)
        .map_err(|source| ListenerError::Listen { addr, source })?;

    let inner: TcpListener = socket.into();
    let local_addr = inner
        .local_addr()
        .map_err(|source| ListenerError::Listen { addr, source })?;

    Ok(Listener { inner, local_addr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback(port: u16) -> ListenerConfig {
        ListenerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            ..ListenerConfig::default()
        }
    }

    #[test]
    fn binds_ephemeral_port() {
        let listener = Listener::bind(&loopback(0)).unwrap();
        assert_ne!(listener.local_addr().port(), 0);
    }

    #[test]
    fn accept_would_block_without_clients() {
        let listener = Listener::bind(&loopback(0)).unwrap();
        let err = listener.try_accept().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn accepts_pending_client() {
        let listener = Listener::bind(&loopback(0)).unwrap();
        let _client = TcpStream::connect(listener.local_addr()).unwrap();

        let mut accepted = None;
        for _ in 0..50 {
            match listener.try_accept() {
                Ok(pair) => {
                    accepted = Some(pair);
                    break;
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(10)),
            }
        }
        assert!(accepted.is_some());
    }

    #[test]
    fn port_in_use_is_bind_error() {
        let first = Listener::bind(&loopback(0)).unwrap();
        let err = Listener::bind(&loopback(first.local_addr().port())).unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }

    #[test]
    fn close_releases_port() {
        let listener = Listener::bind(&loopback(0)).unwrap();
        let addr = listener.local_addr();
        listener.close();
        assert!(TcpStream::connect(addr).is_err());
    }
}
