//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the server before anything else runs
//! - Run the blocking accept loop off the async runtime
//! - Wire termination signals to the shutdown signal
//!
//! # Design Decisions
//! - Fail fast: a bind error is returned before signals are installed
//! - The accept loop owns a blocking thread; signals stay on the runtime

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::MessageHandler;
use crate::lifecycle::{signals, ShutdownSignal};
use crate::server::Server;

/// Serve until SIGINT/SIGTERM, then shut down.
pub async fn run<H: MessageHandler>(config: ServerConfig, handler: H) -> Result<(), ServerError> {
    run_until(config, handler, ShutdownSignal::new()).await
}

/// Serve until `shutdown` is triggered, by a signal or by the caller.
pub async fn run_until<H: MessageHandler>(
    config: ServerConfig,
    handler: H,
    shutdown: ShutdownSignal,
) -> Result<(), ServerError> {
    let server = Server::bind(config, handler, shutdown.clone())?;
    let signal_task = signals::install(shutdown);

    let result = tokio::task::spawn_blocking(move || server.run()).await;
    signal_task.abort();
    result?;
    Ok(())
}
