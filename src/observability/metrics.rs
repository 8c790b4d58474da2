//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_connections_accepted_total` (counter): clients accepted
//! - `server_connections_active` (gauge): workers currently serving
//! - `server_connections_closed_total` (counter): closes by `reason`
//! - `server_messages_processed_total` (counter): handler invocations
//! - `server_message_processing_seconds` (histogram): handler latency
//! - `server_accept_errors_total` (counter): accept failures other than would-block
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is optional and off by default

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

use crate::net::connection::CloseReason;

/// Install the Prometheus exporter, serving scrapes on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn connection_accepted() {
    metrics::counter!("server_connections_accepted_total").increment(1);
}

pub fn connection_opened() {
    metrics::gauge!("server_connections_active").increment(1.0);
}

pub fn connection_closed(reason: CloseReason) {
    metrics::gauge!("server_connections_active").decrement(1.0);
    metrics::counter!("server_connections_closed_total", "reason" => reason.as_str()).increment(1);
}

pub fn message_processed(elapsed: Duration) {
    metrics::counter!("server_messages_processed_total").increment(1);
    metrics::histogram!("server_message_processing_seconds").record(elapsed.as_secs_f64());
}

pub fn accept_error() {
    metrics::counter!("server_accept_errors_total").increment(1);
}
