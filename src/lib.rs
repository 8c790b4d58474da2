//! Thread-per-connection TCP message server.
//!
//! Accepts clients on a single listening socket, gives each one its own
//! worker thread, and runs a read → process → write cycle against a
//! caller-supplied [`MessageHandler`] until the client disconnects or
//! shutdown is requested.

pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use handler::{Echo, MessageHandler};
pub use lifecycle::ShutdownSignal;
pub use server::{start_server, Server};
