//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for Ctrl+C (SIGINT)
//! - Translate it into a shutdown announcement
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failure to install the handler is logged, and shutdown is triggered
//!   so the process never hangs without a way to stop

use super::shutdown::Shutdown;

/// Wait for Ctrl+C, then trigger `shutdown`.
pub async fn wait_for_signal(shutdown: &Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(error) => tracing::error!(error = %error, "Failed to listen for Ctrl+C"),
    }
    shutdown.trigger();
}
