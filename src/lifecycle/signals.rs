//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or, on unix, SIGTERM
//! - Translate the first one into a shutdown trigger

use std::io;

use tokio::sync::broadcast;

/// Resolve once a termination signal arrives.
pub async fn wait_for_signal() -> Result<(), io::Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

/// Broadcast on `shutdown` at the first termination signal.
pub async fn shutdown_on_signal(shutdown: broadcast::Sender<()>) {
    match wait_for_signal().await {
        Ok(()) => tracing::info!("Termination signal received, shutting down"),
        Err(e) => tracing::error!(error = %e, "Failed to install signal handlers, shutting down"),
    }
    // Nobody left to notify once the server has stopped.
    let _ = shutdown.send(());
}
