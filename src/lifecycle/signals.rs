//! OS signal handling.
//!
//! SIGINT and SIGTERM trigger graceful shutdown. SIGHUP asks the store to
//! re-read its file, which is how operators force a reload when the watcher
//! is unavailable.

use std::sync::Arc;

use crate::lifecycle::Shutdown;
use crate::store::ConfigStore;

/// Spawn the signal listener task.
pub fn spawn_signal_handler(shutdown: Shutdown, store: Arc<ConfigStore>) {
    let mut stop = shutdown.subscribe();
    tokio::spawn(async move {
        let mut hangup = install_hangup();

        loop {
            tokio::select! {
                _ = terminate_signal() => {
                    tracing::info!("Shutdown signal received");
                    shutdown.trigger();
                    break;
                }
                _ = stop.recv() => break,
                _ = hangup_signal(&mut hangup) => {
                    let outcome = store.reload().await;
                    tracing::info!(outcome = outcome.as_str(), "Reload requested by SIGHUP");
                }
            }
        }
    });
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
pub async fn terminate_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let term = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = term => {}
    }
}

#[cfg(unix)]
type Hangup = Option<tokio::signal::unix::Signal>;

#[cfg(not(unix))]
type Hangup = ();

#[cfg(unix)]
fn install_hangup() -> Hangup {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGHUP handler");
            None
        }
    }
}

#[cfg(not(unix))]
fn install_hangup() -> Hangup {}

#[cfg(unix)]
async fn hangup_signal(hangup: &mut Hangup) {
    match hangup {
        Some(s) => {
            s.recv().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn hangup_signal(_hangup: &mut Hangup) {
    std::future::pending().await
}
