use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use foody_core::SuggestionWorker;

/// Drains the suggestion queue until `shutdown` flips to `true`.
///
/// A batch that received nothing (or failed to receive) is followed by an idle
/// wait of `idle_wait`; a non-empty batch is followed immediately by the next.
pub fn spawn(
    worker: Arc<SuggestionWorker>,
    idle_wait: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            event_name = "worker.loop.started",
            idle_wait_secs = idle_wait.as_secs(),
            max_messages = worker.settings().max_messages,
            "suggestion worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let idle = match worker.process_batch().await {
                Ok(report) => {
                    if !report.is_empty() {
                        info!(
                            event_name = "worker.batch.completed",
                            received = report.received,
                            delivered = report.delivered,
                            no_matches = report.no_matches,
                            dropped = report.dropped,
                            retained = report.retained,
                            delete_failures = report.delete_failures,
                            "suggestion batch processed"
                        );
                    }
                    report.is_empty()
                }
                Err(error) => {
                    error!(
                        event_name = "worker.batch.failed",
                        error = %error,
                        "could not receive from suggestion queue"
                    );
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(idle_wait) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!(event_name = "worker.loop.stopped", "suggestion worker stopped");
    })
}
