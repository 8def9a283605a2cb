use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    db::Database,
    events::{AppEvent, EventBus},
};

use super::{ConnectivityOracle, SubmissionTransport};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// How an accepted submission travels when the device is online.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    /// Every submission is written to the store first and only flagged synced
    /// after the backend accepts it. An online failure stays queued.
    #[default]
    WriteAhead,
    /// Only offline submissions are stored; online ones go straight to the
    /// backend and are lost if that call fails.
    OfflineOnly,
}

impl DeliveryMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "write-ahead" | "write_ahead" | "writeahead" => Some(Self::WriteAhead),
            "offline-only" | "offline_only" | "offlineonly" => Some(Self::OfflineOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// The backend has the submission.
    Delivered,
    /// Durably stored; a later drain will deliver it.
    Queued { id: u64 },
    /// Online delivery failed and nothing was stored (`OfflineOnly` only).
    Dropped,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DrainOutcome {
    /// Another drain held the queue; nothing was attempted.
    AlreadyRunning,
    Completed { delivered: usize },
    /// Delivery of `failed_id` failed; it and everything after it stay queued.
    Aborted {
        delivered: usize,
        remaining: usize,
        failed_id: u64,
    },
}

/// Persist-then-forward queue in front of the remote submission endpoint.
#[derive(Clone)]
pub struct SubmissionQueue {
    db: Database,
    transport: Arc<dyn SubmissionTransport>,
    connectivity: Arc<dyn ConnectivityOracle>,
    mode: DeliveryMode,
    events: EventBus,
    drain_lock: Arc<Mutex<()>>,
    /// A drain is already waiting behind the running one.
    follow_up_pending: Arc<AtomicBool>,
}

impl SubmissionQueue {
    pub fn new(
        db: Database,
        transport: Arc<dyn SubmissionTransport>,
        connectivity: Arc<dyn ConnectivityOracle>,
        mode: DeliveryMode,
        events: EventBus,
    ) -> Self {
        Self {
            db,
            transport,
            connectivity,
            mode,
            events,
            drain_lock: Arc::new(Mutex::new(())),
            follow_up_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Hands one serialized survey to the queue. Success means the submission
    /// is either at the backend or durably stored (except `Dropped`).
    pub async fn submit(&self, payload: &str) -> Result<SubmitOutcome> {
        let reachable = self.connectivity.is_reachable().await;

        match self.mode {
            DeliveryMode::WriteAhead => {
                let id = self
                    .db
                    .enqueue(payload)
                    .await
                    .context("failed to queue submission")?;

                if !reachable {
                    log_info!("offline; submission {id} queued");
                    return Ok(SubmitOutcome::Queued { id });
                }

                match self.drain().await {
                    Ok(DrainOutcome::AlreadyRunning) => {
                        // The running drain listed its records before this insert.
                        log_info!("drain in progress; submission {id} goes out right after it");
                        self.schedule_follow_up();
                    }
                    Ok(_) => {}
                    Err(err) => log_error!("drain after submit failed: {err:#}"),
                }

                let synced = self
                    .db
                    .get_submission(id)
                    .await?
                    .map(|record| record.synced)
                    .unwrap_or(false);
                Ok(if synced {
                    SubmitOutcome::Delivered
                } else {
                    SubmitOutcome::Queued { id }
                })
            }
            DeliveryMode::OfflineOnly => {
                if !reachable {
                    let id = self
                        .db
                        .enqueue(payload)
                        .await
                        .context("failed to queue submission")?;
                    log_info!("offline; submission {id} queued");
                    return Ok(SubmitOutcome::Queued { id });
                }

                match self.transport.deliver(payload).await {
                    Ok(()) => Ok(SubmitOutcome::Delivered),
                    Err(err) => {
                        log_warn!("online submission failed and was not stored: {err:#}");
                        Ok(SubmitOutcome::Dropped)
                    }
                }
            }
        }
    }

    /// Delivers every unsynced record, oldest first, one at a time. Stops at the
    /// first delivery failure. A call made while another drain is running
    /// returns `AlreadyRunning` without touching anything.
    pub async fn drain(&self) -> Result<DrainOutcome> {
        let Ok(guard) = self.drain_lock.try_lock() else {
            return Ok(DrainOutcome::AlreadyRunning);
        };
        self.drain_locked(guard).await
    }

    /// Queues one more drain behind the running one. Submits that arrive while
    /// a follow-up is still waiting share it.
    fn schedule_follow_up(&self) {
        if self.follow_up_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        let queue = self.clone();
        tokio::spawn(async move {
            let guard = queue.drain_lock.lock().await;
            // Cleared before listing, so anything enqueued from here on either
            // shows up in this pass or schedules its own follow-up.
            queue.follow_up_pending.store(false, Ordering::SeqCst);
            match queue.drain_locked(guard).await {
                Ok(outcome) => log_info!("follow-up drain finished: {outcome:?}"),
                Err(err) => log_error!("follow-up drain failed: {err:#}"),
            }
        });
    }

    async fn drain_locked(&self, _guard: MutexGuard<'_, ()>) -> Result<DrainOutcome> {
        let pending = self
            .db
            .list_unsynced()
            .await
            .context("failed to load unsynced submissions")?;
        if pending.is_empty() {
            return Ok(DrainOutcome::Completed { delivered: 0 });
        }

        log_info!("draining {} queued submission(s)", pending.len());
        let total = pending.len();
        let mut delivered = 0;

        for record in pending {
            if let Err(err) = self.transport.deliver(&record.payload).await {
                let remaining = total - delivered;
                log_warn!(
                    "delivery of submission {} failed, {} left queued: {err:#}",
                    record.id,
                    remaining
                );
                self.events.emit(AppEvent::DrainFinished {
                    delivered,
                    remaining,
                });
                return Ok(DrainOutcome::Aborted {
                    delivered,
                    remaining,
                    failed_id: record.id,
                });
            }

            self.db
                .mark_synced(record.id)
                .await
                .with_context(|| format!("submission {} delivered but not marked", record.id))?;
            delivered += 1;
        }

        log_info!("drain finished, {delivered} submission(s) delivered");
        self.events.emit(AppEvent::DrainFinished {
            delivered,
            remaining: 0,
        });
        Ok(DrainOutcome::Completed { delivered })
    }
}
