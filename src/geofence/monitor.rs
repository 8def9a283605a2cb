use serde::Serialize;
use tokio::time;

use super::{haversine_km, GeofencePolicy, LocationProvider, PermissionStatus};
use crate::{models::Coordinates, session::SessionStore};

/// Result of one polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CycleOutcome {
    /// The session (and its anchor) disappeared, e.g. a concurrent logout.
    NoAnchor,
    /// Permission not granted; skipped without any notice.
    PermissionDenied,
    /// Permission or location lookup failed; skipped and logged.
    Skipped { reason: String },
    Inside { distance_km: f64 },
    Outside { distance_km: f64 },
}

/// Strictly greater than the radius trips the fence; exactly on it does not.
pub fn is_outside(anchor: Coordinates, current: Coordinates, radius_km: f64) -> (bool, f64) {
    let distance_km = haversine_km(anchor, current);
    (distance_km > radius_km, distance_km)
}

/// One check against the anchor as it is stored right now.
pub async fn run_cycle(
    location: &dyn LocationProvider,
    session: &SessionStore,
    policy: &GeofencePolicy,
) -> CycleOutcome {
    let Some(anchor) = session.anchor() else {
        return CycleOutcome::NoAnchor;
    };

    match time::timeout(policy.location_timeout, location.request_permission()).await {
        Ok(Ok(PermissionStatus::Granted)) => {}
        Ok(Ok(_)) => return CycleOutcome::PermissionDenied,
        Ok(Err(err)) => {
            return CycleOutcome::Skipped {
                reason: format!("permission check failed: {err:#}"),
            }
        }
        Err(_) => {
            return CycleOutcome::Skipped {
                reason: "permission check timed out".into(),
            }
        }
    }

    let current = match time::timeout(policy.location_timeout, location.current_position()).await
    {
        Ok(Ok(current)) => current,
        Ok(Err(err)) => {
            return CycleOutcome::Skipped {
                reason: format!("location unavailable: {err:#}"),
            }
        }
        Err(_) => {
            return CycleOutcome::Skipped {
                reason: "location read timed out".into(),
            }
        }
    };

    let (outside, distance_km) = is_outside(anchor, current, policy.radius_km);
    if outside {
        CycleOutcome::Outside { distance_km }
    } else {
        CycleOutcome::Inside { distance_km }
    }
}
