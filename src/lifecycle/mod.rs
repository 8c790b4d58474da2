//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Run accept loop on a blocking thread → Wait for signal
//!
//! Shutdown (shutdown.rs):
//!     trigger() → Accept loop exits → Blocked workers woken → Listener closed
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a listener that cannot be bound aborts startup
//! - Shutdown is cooperative: workers are woken, never joined

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::ShutdownSignal;
