//! Running a sync under a deadline and the process shutdown signals.
//!
//! Neither a timeout nor an interruption undoes remote changes already applied.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};
use wiki_publish_core::{SyncEngine, SyncOutcome};

/// Run one sync, failing if it has not finished within `timeout`.
pub async fn run_sync(
    engine: &SyncEngine,
    ancestor: &str,
    timeout: Option<Duration>,
) -> anyhow::Result<SyncOutcome> {
    let run = engine.sync(ancestor);
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .map_err(|_| anyhow::anyhow!("sync did not finish within {:?}", limit))??,
        None => run.await?,
    };
    Ok(outcome)
}

/// Like [`run_sync`], but gives up as soon as `shutdown` resolves.
pub async fn run_until<S>(
    engine: &SyncEngine,
    ancestor: &str,
    timeout: Option<Duration>,
    shutdown: S,
) -> anyhow::Result<SyncOutcome>
where
    S: Future<Output = ()>,
{
    tokio::select! {
        outcome = run_sync(engine, ancestor, timeout) => outcome,
        _ = shutdown => {
            anyhow::bail!("sync interrupted; changes already applied remotely are kept")
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, aborting sync");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, aborting sync");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
