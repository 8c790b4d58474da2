//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Listening socket
//!     → listener.rs (create, SO_REUSEADDR, non-blocking, bind, listen)
//!     → accept.rs (poll accept, honour shutdown)
//!     → connection.rs (one worker thread per client)
//!         → buffer.rs (fixed-capacity message staging)
//!         → MessageHandler (external processing)
//!
//! Connection States:
//!     Accepted → Reading → Processing → Writing → Reading | Closing → Closed
//! ```
//!
//! # Design Decisions
//! - One OS thread per connection; no pooling or multiplexing
//! - Listener polled in non-blocking mode, client sockets are blocking
//! - Each connection tracked so shutdown can wake blocked workers

pub mod accept;
pub mod buffer;
pub mod connection;
pub mod listener;

pub use accept::{wait_for_client, Accepted};
pub use buffer::{MessageBuffer, ReadOutcome};
pub use connection::{CloseReason, ConnectionId, ConnectionRegistry, ConnectionState, ConnectionWorker};
pub use listener::{Listener, ListenerError};
