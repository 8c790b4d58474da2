//! Top-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::net::ListenerError;

/// Errors that stop the server from starting or running.
///
/// Per-connection failures never surface here; they close the affected
/// connection and are logged.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The accept loop thread panicked or was cancelled.
    #[error("Server thread failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The Prometheus exporter could not be installed.
    #[error("Failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// A global subscriber was already installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
