//! Signal handling for graceful shutdown of the world server.

use tracing::info;

/// Waits for a shutdown signal (SIGINT or SIGTERM on Unix, Ctrl+C on
/// Windows), logging what was received.
pub async fn setup_signal_handlers() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("📡 Received SIGINT - initiating graceful shutdown");
            }
            _ = sigterm.recv() => {
                info!("📡 Received SIGTERM - initiating graceful shutdown");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("📡 Received Ctrl+C - initiating graceful shutdown");
    }

    Ok(())
}

/// Same as [`setup_signal_handlers`] but without logging, for watching for
/// a repeated signal during an already-running shutdown.
pub async fn setup_signal_handlers_silent() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
