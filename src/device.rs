use anyhow::Result;
use log::info;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::settings::SettingsStore;

/// SHA-256 of `seed`, hex encoded.
pub fn hash_device_seed(seed: &str) -> String {
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// Returns the per-install device id, generating and persisting one on first
/// use. The check and the write happen under one settings lock.
pub fn device_id(settings: &SettingsStore) -> Result<String> {
    settings.update(|s| {
        if let Some(existing) = &s.device_id {
            return existing.clone();
        }
        let id = hash_device_seed(&Uuid::new_v4().to_string());
        info!("Generated new device id");
        s.device_id = Some(id.clone());
        id
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hashed = hash_device_seed("abc");
        assert_eq!(
            hashed,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn id_is_stable_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let first = device_id(&SettingsStore::open(path.clone()).unwrap()).unwrap();
        let second = device_id(&SettingsStore::open(path).unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}
