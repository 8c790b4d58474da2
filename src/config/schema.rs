//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default capacity of a connection's message buffer, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10_000;

/// Default listen backlog.
pub const DEFAULT_BACKLOG: i32 = 5;

/// Default interval between non-blocking accept attempts.
pub const DEFAULT_ACCEPT_POLL_INTERVAL_MS: u64 = 100;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening socket configuration.
    pub listener: ListenerConfig,

    /// Per-connection settings.
    pub connection: ConnectionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Default configuration listening on `port`.
    pub fn with_port(port: u16) -> Self {
        let mut config = Self::default();
        config.listener.port = port;
        config
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind. Defaults to all IPv4 interfaces.
    pub host: IpAddr,

    /// Port to bind. `0` asks the OS for an ephemeral port.
    pub port: u16,

    /// Maximum pending connections queued by the OS.
    pub backlog: i32,

    /// Delay between accept attempts when no client is waiting, in milliseconds.
    pub accept_poll_interval_ms: u64,
}

impl ListenerConfig {
    /// The socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn accept_poll_interval(&self) -> Duration {
        Duration::from_millis(self.accept_poll_interval_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 9000,
            backlog: DEFAULT_BACKLOG,
            accept_poll_interval_ms: DEFAULT_ACCEPT_POLL_INTERVAL_MS,
        }
    }
}

/// Per-connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Capacity of each connection's message buffer. Reads larger than
    /// this close the connection.
    pub max_message_size: usize,

    /// Shut down open client sockets when the server stops, waking workers
    /// blocked in a read.
    pub close_on_shutdown: bool,

    /// Set TCP_NODELAY on accepted connections.
    pub nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            close_on_shutdown: true,
            nodelay: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.listener.backlog, 5);
        assert_eq!(config.listener.accept_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.listener.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.connection.max_message_size, 10_000);
        assert!(config.connection.close_on_shutdown);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            port = 5020

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 5020);
        assert_eq!(config.listener.backlog, DEFAULT_BACKLOG);
        assert_eq!(config.connection, ConnectionConfig::default());
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn with_port_sets_socket_addr() {
        let config = ServerConfig::with_port(1502);
        assert_eq!(config.listener.socket_addr().port(), 1502);
    }
}
