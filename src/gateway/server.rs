//! Serving the router and waiting for termination signals.

use std::future::Future;

use tokio::net::TcpListener;

use super::router;
use crate::core::{Scheduler, TaskExecutor};
use crate::runtime::Spawn;

/// Serve the gateway on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve<E, S, F>(
    listener: TcpListener,
    scheduler: Scheduler<E, S>,
    shutdown: F,
) -> std::io::Result<()>
where
    E: TaskExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "gateway listening");
    }
    axum::serve(listener, router(scheduler))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Waits for SIGINT, SIGTERM or SIGQUIT.
///
/// # Errors
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for Ctrl-C.
///
/// # Errors
///
/// Returns `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
