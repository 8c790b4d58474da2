//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (backlog, poll interval, buffer size)
//! - Check observability settings parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Upper bound on the per-connection buffer.
pub const MAX_MESSAGE_SIZE_LIMIT: usize = 16 * 1024 * 1024;

/// Upper bound on the accept poll interval, in milliseconds.
pub const MAX_ACCEPT_POLL_INTERVAL_MS: u64 = 10_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.backlog must be positive (got {0})")]
    Backlog(i32),

    #[error("listener.accept_poll_interval_ms must be between 1 and {max} (got {value})")]
    PollInterval { value: u64, max: u64 },

    #[error("connection.max_message_size must be between 1 and {max} (got {value})")]
    MaxMessageSize { value: usize, max: usize },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.backlog <= 0 {
        errors.push(ValidationError::Backlog(listener.backlog));
    }
    if listener.accept_poll_interval_ms == 0
        || listener.accept_poll_interval_ms > MAX_ACCEPT_POLL_INTERVAL_MS
    {
        errors.push(ValidationError::PollInterval {
            value: listener.accept_poll_interval_ms,
            max: MAX_ACCEPT_POLL_INTERVAL_MS,
        });
    }

    let size = config.connection.max_message_size;
    if size == 0 || size > MAX_MESSAGE_SIZE_LIMIT {
        errors.push(ValidationError::MaxMessageSize {
            value: size,
            max: MAX_MESSAGE_SIZE_LIMIT,
        });
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
