use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::models::{Coordinates, UserProfile};

/// Everything the app keeps outside the submission table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_submit_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_location: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airport_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airport_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// Key/value settings persisted as a JSON file.
///
/// Every mutation rewrites the whole file through a temp file + rename, so a
/// crash mid-write leaves the previous contents intact.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StoredSettings>,
}

impl SettingsStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Settings file {} is unreadable ({err}); starting from defaults",
                    path.display()
                );
                StoredSettings::default()
            })
        } else {
            StoredSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> StoredSettings {
        self.read().clone()
    }

    pub fn read_with<T>(&self, f: impl FnOnce(&StoredSettings) -> T) -> T {
        f(&self.read())
    }

    /// Applies `f` and persists the result. If persisting fails the in-memory
    /// copy is rolled back so memory and disk never disagree.
    pub fn update<T>(&self, f: impl FnOnce(&mut StoredSettings) -> T) -> Result<T> {
        let mut guard = self.write();
        let previous = guard.clone();
        let out = f(&mut guard);
        if *guard == previous {
            return Ok(out);
        }
        if let Err(err) = self.persist(&guard) {
            *guard = previous;
            return Err(err);
        }
        Ok(out)
    }

    fn persist(&self, data: &StoredSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory {}", parent.display())
                })?;
            }
        }

        let serialized = serde_json::to_string_pretty(data)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("Failed to write settings to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace settings at {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoredSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoredSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
