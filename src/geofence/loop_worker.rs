use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{controller::GeofenceController, monitor::run_cycle, CycleOutcome};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Polls until the fence trips, the session disappears, or the token is
/// cancelled. The first check happens one interval after start.
pub async fn geofence_loop(controller: GeofenceController, cancel_token: CancellationToken) {
    let interval = controller.policy().interval;
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = run_cycle(
                    controller.location().as_ref(),
                    controller.session(),
                    &controller.policy(),
                )
                .await;

                match outcome {
                    CycleOutcome::Inside { .. } | CycleOutcome::PermissionDenied => {}
                    CycleOutcome::Skipped { reason } => {
                        log_warn!("geofence cycle skipped: {reason}");
                    }
                    CycleOutcome::NoAnchor => {
                        log_info!("session anchor gone; geofence monitoring stops");
                        controller.mark_inactive().await;
                        break;
                    }
                    CycleOutcome::Outside { distance_km } => {
                        controller.trigger(distance_km).await;
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("geofence loop shutting down");
                break;
            }
        }
    }
}
