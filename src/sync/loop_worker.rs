use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::queue::{DrainOutcome, SubmissionQueue};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Drains once at start if already online (a restart is a retry trigger), then
/// whenever a change is observed and the latest value is reachable. A quick
/// down/up flap reaches `watch` subscribers as one change that reads reachable.
pub async fn sync_loop(
    queue: SubmissionQueue,
    mut reachability: watch::Receiver<bool>,
    cancel_token: CancellationToken,
) {
    if *reachability.borrow_and_update() {
        run_drain(&queue, "startup").await;
    }

    loop {
        tokio::select! {
            changed = reachability.changed() => {
                if changed.is_err() {
                    log_info!("connectivity source closed; sync loop exiting");
                    break;
                }
                if *reachability.borrow_and_update() {
                    run_drain(&queue, "reconnect").await;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("sync loop shutting down");
                break;
            }
        }
    }
}

async fn run_drain(queue: &SubmissionQueue, trigger: &str) {
    match queue.drain().await {
        Ok(DrainOutcome::AlreadyRunning) => {
            log_info!("{trigger} drain skipped: another drain is running");
        }
        Ok(DrainOutcome::Completed { delivered }) => {
            if delivered > 0 {
                log_info!("{trigger} drain delivered {delivered} submission(s)");
            }
        }
        Ok(DrainOutcome::Aborted {
            delivered,
            remaining,
            failed_id,
        }) => {
            log_info!(
                "{trigger} drain stopped at submission {failed_id} ({delivered} delivered, {remaining} queued)"
            );
        }
        Err(err) => log_error!("{trigger} drain failed: {err:#}"),
    }
}
