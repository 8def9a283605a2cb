use std::{env, path::PathBuf, time::Duration};

use log::warn;

use crate::{
    cooldown::COOLDOWN_DURATION,
    geofence::{FixedLocation, GeofencePolicy},
    models::Coordinates,
    sync::DeliveryMode,
};

pub const DEFAULT_API_URL: &str = "http://192.168.1.2:5000/api";
pub const DATABASE_FILE: &str = "survey.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";
const APP_DIR_NAME: &str = "aai-survey";

/// Runtime configuration for the client core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL; endpoint paths are appended to it.
    pub api_url: String,
    pub data_dir: PathBuf,
    pub debug: bool,
    pub delivery_mode: DeliveryMode,
    /// Position reported on hosts without a location service.
    pub fixed_location: Option<Coordinates>,

    pub cooldown: Duration,
    pub geofence: GeofencePolicy,

    pub http_timeout: Duration,
    pub http_connect_timeout: Duration,
    pub probe_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            debug: false,
            delivery_mode: DeliveryMode::default(),
            fixed_location: None,
            cooldown: COOLDOWN_DURATION,
            geofence: GeofencePolicy::default(),
            http_timeout: Duration::from_secs(10),
            http_connect_timeout: Duration::from_secs(5),
            probe_interval: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by environment variables.
    ///
    /// - `AAI_SURVEY_API_URL`: backend base URL
    /// - `AAI_SURVEY_DATA_DIR`: where the database and settings live
    /// - `AAI_SURVEY_DEBUG`: `1`/`true` for debug logging
    /// - `AAI_SURVEY_DELIVERY_MODE`: `write-ahead` (default) or `offline-only`
    /// - `AAI_SURVEY_LOCATION`: `lat,lon` reported as the device position
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("AAI_SURVEY_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        if let Some(dir) = lookup("AAI_SURVEY_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        config.debug = lookup("AAI_SURVEY_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if let Some(mode) = lookup("AAI_SURVEY_DELIVERY_MODE") {
            match DeliveryMode::parse(&mode) {
                Some(parsed) => config.delivery_mode = parsed,
                None => warn!("Unknown delivery mode '{mode}', using {:?}", config.delivery_mode),
            }
        }
        if let Some(value) = lookup("AAI_SURVEY_LOCATION") {
            match FixedLocation::parse(&value) {
                Ok(position) => config.fixed_location = Some(position),
                Err(err) => warn!("Ignoring AAI_SURVEY_LOCATION: {err:#}"),
            }
        }

        config
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
