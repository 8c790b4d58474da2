//! Server orchestration.
//!
//! # Responsibilities
//! - Validate configuration and create the listening socket
//! - Run the accept loop until shutdown
//! - Spawn one detached worker thread per accepted client
//! - Wake blocked workers and close the listener on shutdown
//!
//! # Design Decisions
//! - Fail fast: no accept loop without a bound listener
//! - Workers are never joined; shutdown returns once the accept loop exits

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::error::ServerError;
use crate::handler::MessageHandler;
use crate::lifecycle::ShutdownSignal;
use crate::net::{wait_for_client, Accepted, ConnectionRegistry, ConnectionWorker, Listener};
use crate::observability::metrics;

/// A bound server, ready to accept clients.
pub struct Server<H> {
    listener: Listener,
    config: ServerConfig,
    handler: Arc<H>,
    shutdown: ShutdownSignal,
    connections: ConnectionRegistry,
}

impl<H: MessageHandler> Server<H> {
    /// Validate `config` and bind the listening socket.
    pub fn bind(config: ServerConfig, handler: H, shutdown: ShutdownSignal) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let listener = Listener::bind(&config.listener)?;

        Ok(Self {
            listener,
            config,
            handler: Arc::new(handler),
            shutdown,
            connections: ConnectionRegistry::new(),
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Handle to the live connection registry.
    pub fn connections(&self) -> ConnectionRegistry {
        self.connections.clone()
    }

    /// Accept clients until shutdown is triggered.
    ///
    /// Blocks the calling thread. Returns after the accept loop exits and the
    /// listening socket is closed; connection workers may still be finishing.
    pub fn run(self) {
        let poll_interval = self.config.listener.accept_poll_interval();
        tracing::info!(
            address = %self.local_addr(),
            max_message_size = self.config.connection.max_message_size,
            "Server started"
        );

        while let Some(accepted) = wait_for_client(&self.listener, &self.shutdown, poll_interval) {
            metrics::connection_accepted();
            self.spawn_worker(accepted);
        }

        let Self {
            listener,
            config,
            connections,
            ..
        } = self;

        if config.connection.close_on_shutdown {
            let woken = connections.close_all();
            if woken > 0 {
                tracing::info!(connections = woken, "Closed open connections for shutdown");
            }
        }

        listener.close();
        tracing::info!(open_connections = connections.len(), "Server stopped");
    }

    fn spawn_worker(&self, accepted: Accepted) {
        let peer_addr = accepted.peer_addr;
        let worker = match ConnectionWorker::new(
            accepted,
            Arc::clone(&self.handler),
            self.shutdown.clone(),
            &self.connections,
            &self.config.connection,
        ) {
            Ok(worker) => worker,
            Err(e) => {
                tracing::warn!(peer_addr = %peer_addr, error = %e, "Failed to set up connection");
                return;
            }
        };

        let id = worker.id();
        tracing::trace!(connection_id = %id, peer_addr = %peer_addr, "Client accepted, spawning worker");

        let spawned = thread::Builder::new()
            .name(id.to_string())
            .spawn(move || {
                worker.run();
            });
        if let Err(e) = spawned {
            tracing::error!(connection_id = %id, error = %e, "Failed to spawn worker thread");
        }
    }
}

/// Serve `handler` on `port` (all interfaces) until `shutdown` is triggered.
///
/// Blocks the calling thread. Fails without entering the accept loop if the
/// listening socket cannot be created.
pub fn start_server<H: MessageHandler>(
    port: u16,
    shutdown: ShutdownSignal,
    handler: H,
) -> Result<(), ServerError> {
    Server::bind(ServerConfig::with_port(port), handler, shutdown)?.run();
    Ok(())
}
