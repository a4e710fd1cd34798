//! Reload task and the reload pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::store::config_store::Shared;
use crate::store::persist::{self, LoadError};
use crate::store::watcher::FileChange;
use crate::store::ConfigDocument;

/// Result of one pass of the reload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// New content was published.
    Applied,
    /// The file matched the current snapshot.
    Unchanged,
    /// The file is gone and a non-empty snapshot was reset to empty.
    Reset,
    /// The file is malformed, or still truncated after the last attempt;
    /// the previous snapshot was kept.
    Rejected,
    /// The file stayed unreadable (I/O error) for every attempt.
    Skipped,
    /// The store shut down mid-pass.
    Cancelled,
}

impl ReloadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadOutcome::Applied => "applied",
            ReloadOutcome::Unchanged => "unchanged",
            ReloadOutcome::Reset => "reset",
            ReloadOutcome::Rejected => "rejected",
            ReloadOutcome::Skipped => "skipped",
            ReloadOutcome::Cancelled => "cancelled",
        }
    }
}

/// Body of the reload task.
///
/// Watch events are delayed and coalesced into a single pass. When a poll
/// interval is configured the file is also re-read on that schedule,
/// whether or not the watcher is alive.
pub(super) async fn run(
    shared: Arc<Shared>,
    mut events: mpsc::UnboundedReceiver<FileChange>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let reload_delay = Duration::from_millis(shared.settings.reload_delay_ms);
    let mut poll = shared.settings.poll_interval_secs.map(|secs| {
        let period = Duration::from_secs(secs);
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,

            change = events.recv(), if events_open => {
                let Some(change) = change else {
                    tracing::debug!("Config watcher stopped");
                    events_open = false;
                    continue;
                };
                if shared.suppression.is_active() {
                    tracing::trace!(?change, "Ignoring event from our own write");
                    continue;
                }
                tracing::debug!(?change, "Config file changed");

                // Let the writer finish, then fold everything that arrived meanwhile into one pass.
                if !sleep_or_shutdown(reload_delay, &mut shutdown).await {
                    break;
                }
                while events.try_recv().is_ok() {}

                if reload_pass(&shared, &mut shutdown).await == ReloadOutcome::Cancelled {
                    break;
                }
            }

            _ = next_tick(&mut poll) => {
                if reload_pass(&shared, &mut shutdown).await == ReloadOutcome::Cancelled {
                    break;
                }
            }
        }
    }

    tracing::debug!(path = %shared.path.display(), "Reload task stopped");
}

/// Read the file and reconcile the snapshot with it.
///
/// Each attempt holds the write gate for one read and publish, never across a
/// backoff sleep.
pub(super) async fn reload_pass(
    shared: &Shared,
    shutdown: &mut broadcast::Receiver<()>,
) -> ReloadOutcome {
    let settings = &shared.settings;
    let attempts = settings.max_read_attempts.max(1);

    let mut outcome = ReloadOutcome::Skipped;
    for attempt in 1..=attempts {
        let failure = {
            let _gate = shared.write_gate.lock().await;
            match persist::load::<ConfigDocument>(&shared.path).await {
                Ok(doc) => {
                    outcome = apply(shared, doc);
                    break;
                }
                Err(LoadError::Missing) => {
                    outcome = reset(shared);
                    break;
                }
                Err(e) if e.is_transient() => e,
                Err(e) => {
                    tracing::warn!(
                        path = %shared.path.display(),
                        error = %e,
                        "Config file is malformed, keeping current configuration"
                    );
                    outcome = ReloadOutcome::Rejected;
                    break;
                }
            }
        };

        tracing::debug!(
            path = %shared.path.display(),
            attempt,
            error = %failure,
            "Config file not readable yet"
        );

        if attempt < attempts {
            let delay = calculate_backoff(
                attempt,
                settings.retry_base_delay_ms,
                settings.retry_max_delay_ms,
            );
            if !sleep_or_shutdown(delay, shutdown).await {
                outcome = ReloadOutcome::Cancelled;
                break;
            }
        } else if matches!(failure, LoadError::Truncated(_)) {
            // Never completed by its writer, so treat it like any other bad content.
            tracing::warn!(
                path = %shared.path.display(),
                attempts,
                error = %failure,
                "Config file is malformed, keeping current configuration"
            );
            outcome = ReloadOutcome::Rejected;
        } else {
            tracing::debug!(attempts, "Giving up on this reload");
        }
    }

    tracing::debug!(outcome = outcome.as_str(), "Reload pass finished");
    metrics::record_reload(outcome.as_str());
    outcome
}

fn apply(shared: &Shared, doc: ConfigDocument) -> ReloadOutcome {
    if shared.current() == doc {
        return ReloadOutcome::Unchanged;
    }

    tracing::info!(
        path = %shared.path.display(),
        ip_addresses = ?doc.ip_addresses,
        "Configuration reloaded from disk"
    );
    shared.publish(doc);
    ReloadOutcome::Applied
}

fn reset(shared: &Shared) -> ReloadOutcome {
    if shared.current().is_empty() {
        return ReloadOutcome::Unchanged;
    }

    tracing::info!(
        path = %shared.path.display(),
        "Config file removed, configuration reset to empty"
    );
    shared.publish(ConfigDocument::default());
    ReloadOutcome::Reset
}

async fn sleep_or_shutdown(delay: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = time::sleep(delay) => true,
        _ = shutdown.recv() => false,
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
