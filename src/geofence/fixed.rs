use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{LocationProvider, PermissionStatus};
use crate::models::Coordinates;

/// Location source for hosts without a positioning service: reports a
/// configured position, or denies permission when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    position: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    /// Parses `"lat,lon"`.
    pub fn parse(value: &str) -> Result<Coordinates> {
        let (lat, lon) = value
            .split_once(',')
            .ok_or_else(|| anyhow!("expected 'lat,lon', got '{value}'"))?;
        let latitude: f64 = lat.trim().parse()?;
        let longitude: f64 = lon.trim().parse()?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("coordinates out of range: {value}"));
        }
        Ok(Coordinates::new(latitude, longitude))
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(if self.position.is_some() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.position
            .ok_or_else(|| anyhow!("no position configured"))
    }
}
