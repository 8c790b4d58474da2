//! conn-server
//!
//! Runs the thread-per-connection server with the built-in echo handler.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                   CONN SERVER                    │
//!                 │                                                  │
//!  Client ────────┼─▶ listener ──▶ accept loop ──▶ worker thread ───┐│
//!                 │   (socket2)    (poll 100ms)    (per client)     ││
//!                 │                     ▲               │           ││
//!                 │                     │          MessageHandler   ││
//!  Client ◀───────┼─────────────────────┼───────────────┘           ││
//!                 │                     │                           ││
//!                 │            ShutdownSignal ◀── SIGINT/SIGTERM    ││
//!                 │                     │                           ││
//!                 │           connection registry ◀─────────────────┘│
//!                 └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use conn_server::config::{read_config, validate_config, ConfigError, ServerConfig};
use conn_server::lifecycle::startup;
use conn_server::observability::{logging, metrics};
use conn_server::{Echo, ServerError};

#[derive(Parser)]
#[command(name = "conn-server")]
#[command(about = "Thread-per-connection TCP message server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Per-connection buffer capacity in bytes.
    #[arg(long)]
    max_message_size: Option<usize>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long)]
    metrics: bool,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(size) = self.max_message_size {
            config.connection.max_message_size = size;
        }
        if self.metrics {
            config.observability.metrics_enabled = true;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability)?;
    tracing::info!("conn-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        address = %config.listener.socket_addr(),
        backlog = config.listener.backlog,
        max_message_size = config.connection.max_message_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // validated above
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr)?;
        }
    }

    startup::run(config, Echo).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
