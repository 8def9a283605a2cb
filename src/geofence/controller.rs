use std::sync::Arc;

use log::{error, info, warn};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{loop_worker::geofence_loop, GeofencePolicy, GeofenceStatus, LocationProvider};
use crate::{
    error::Alert,
    events::{AppEvent, EventBus},
    navigation::Route,
    session::SessionStore,
};

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Drives the Inactive → Monitoring → Triggered state machine and owns the
/// polling task.
#[derive(Clone)]
pub struct GeofenceController {
    status: Arc<Mutex<GeofenceStatus>>,
    session: SessionStore,
    location: Arc<dyn LocationProvider>,
    policy: GeofencePolicy,
    events: EventBus,
    ticker: Arc<Mutex<Option<Ticker>>>,
}

impl GeofenceController {
    pub fn new(
        session: SessionStore,
        location: Arc<dyn LocationProvider>,
        policy: GeofencePolicy,
        events: EventBus,
    ) -> Self {
        Self {
            status: Arc::new(Mutex::new(GeofenceStatus::Inactive)),
            session,
            location,
            policy,
            events,
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn status(&self) -> GeofenceStatus {
        *self.status.lock().await
    }

    pub fn policy(&self) -> GeofencePolicy {
        self.policy
    }

    pub fn location(&self) -> &Arc<dyn LocationProvider> {
        &self.location
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// A protected view was entered. Starts polling only if the session has an
    /// anchor; a triggered monitor stays triggered until `reset`.
    pub async fn enter_dashboard(&self) -> GeofenceStatus {
        {
            let mut status = self.status.lock().await;
            match *status {
                GeofenceStatus::Monitoring | GeofenceStatus::Triggered => return *status,
                GeofenceStatus::Inactive => {}
            }
            if self.session.anchor().is_none() {
                info!("No login anchor; geofence not applied");
                return GeofenceStatus::Inactive;
            }
            *status = GeofenceStatus::Monitoring;
        }

        self.spawn_ticker().await;
        info!(
            "Geofence monitoring started ({} km, every {:?})",
            self.policy.radius_km, self.policy.interval
        );
        self.emit_status(GeofenceStatus::Monitoring);
        GeofenceStatus::Monitoring
    }

    /// The protected view was left normally. No notice, no navigation.
    pub async fn exit_dashboard(&self) -> GeofenceStatus {
        let current = {
            let mut status = self.status.lock().await;
            if *status == GeofenceStatus::Monitoring {
                *status = GeofenceStatus::Inactive;
            }
            *status
        };

        self.cancel_ticker().await;
        if current == GeofenceStatus::Inactive {
            self.emit_status(current);
        }
        current
    }

    /// Called on a fresh login so a previously triggered monitor can arm again.
    pub async fn reset(&self) {
        self.cancel_ticker().await;
        *self.status.lock().await = GeofenceStatus::Inactive;
    }

    /// The user dismissed the session-ended notice.
    pub fn acknowledge_session_end(&self) -> Route {
        Route::Login
    }

    pub(super) async fn trigger(&self, distance_km: f64) {
        {
            let mut status = self.status.lock().await;
            if *status != GeofenceStatus::Monitoring {
                return;
            }
            *status = GeofenceStatus::Triggered;
        }

        warn!(
            "Device is {distance_km:.2} km from the login location (limit {} km); ending session",
            self.policy.radius_km
        );
        if let Err(err) = self.session.clear() {
            error!("Failed to clear session after geofence violation: {err:#}");
        }

        self.emit_status(GeofenceStatus::Triggered);
        self.events.emit(AppEvent::SessionEnded {
            alert: Alert::new(
                "Session Ended",
                format!(
                    "You have moved outside the {} km allowed area.",
                    self.policy.radius_km
                ),
            ),
        });
    }

    pub(super) async fn mark_inactive(&self) {
        let mut status = self.status.lock().await;
        if *status == GeofenceStatus::Monitoring {
            *status = GeofenceStatus::Inactive;
            drop(status);
            self.emit_status(GeofenceStatus::Inactive);
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(old) = ticker_guard.take() {
            old.cancel_token.cancel();
            old.handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(geofence_loop(self.clone(), cancel_token.clone()));
        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        let ticker = self.ticker.lock().await.take();
        if let Some(ticker) = ticker {
            ticker.cancel_token.cancel();
            if let Err(err) = ticker.handle.await {
                if !err.is_cancelled() {
                    error!("Geofence loop ended abnormally: {err}");
                }
            }
        }
    }

    fn emit_status(&self, status: GeofenceStatus) {
        self.events.emit(AppEvent::GeofenceStatusChanged { status });
    }
}
