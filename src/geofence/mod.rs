//! Location-based session guard: while a dashboard is open the device position
//! is polled and compared with the anchor captured at login.

pub mod controller;
pub mod distance;
pub mod fixed;
pub mod loop_worker;
pub mod monitor;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Coordinates;

pub use controller::GeofenceController;
pub use distance::haversine_km;
pub use fixed::FixedLocation;
pub use monitor::{run_cycle, CycleOutcome};

pub const GEOFENCE_RADIUS_KM: f64 = 2.0;
pub const GEOFENCE_INTERVAL: Duration = Duration::from_secs(3);
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Device location capability.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Asks for (or confirms) foreground location permission.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    async fn current_position(&self) -> Result<Coordinates>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GeofenceStatus {
    #[default]
    Inactive,
    Monitoring,
    /// Terminal until the next login.
    Triggered,
}

#[derive(Debug, Clone, Copy)]
pub struct GeofencePolicy {
    pub radius_km: f64,
    pub interval: Duration,
    pub location_timeout: Duration,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            radius_km: GEOFENCE_RADIUS_KM,
            interval: GEOFENCE_INTERVAL,
            location_timeout: LOCATION_TIMEOUT,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::{LocationProvider, PermissionStatus};
    use crate::models::Coordinates;

    pub struct FakeLocation {
        pub permission: Mutex<Result<PermissionStatus, String>>,
        pub position: Mutex<Option<Coordinates>>,
        pub permission_calls: AtomicUsize,
    }

    impl FakeLocation {
        pub fn at(position: Coordinates) -> Self {
            Self {
                permission: Mutex::new(Ok(PermissionStatus::Granted)),
                position: Mutex::new(Some(position)),
                permission_calls: AtomicUsize::new(0),
            }
        }

        pub fn move_to(&self, position: Option<Coordinates>) {
            *self.position.lock().unwrap() = position;
        }

        pub fn set_permission(&self, permission: Result<PermissionStatus, String>) {
            *self.permission.lock().unwrap() = permission;
        }

        pub fn permission_calls(&self) -> usize {
            self.permission_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LocationProvider for FakeLocation {
        async fn request_permission(&self) -> Result<PermissionStatus> {
            self.permission_calls.fetch_add(1, Ordering::SeqCst);
            self.permission.lock().unwrap().clone().map_err(|e| anyhow!(e))
        }

        async fn current_position(&self) -> Result<Coordinates> {
            self.position
                .lock()
                .unwrap()
                .ok_or_else(|| anyhow!("location unavailable"))
        }
    }

    /// Point `km` kilometres due north of `from`.
    pub fn north_of(from: Coordinates, km: f64) -> Coordinates {
        let degrees = (km / super::distance::EARTH_RADIUS_KM).to_degrees();
        Coordinates::new(from.latitude + degrees, from.longitude)
    }
}
