use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::{
    models::{AuthSession, Coordinates},
    settings::SettingsStore,
};

/// Session-scoped view over the settings file: auth token, user and the login
/// anchor. Reads always hit the shared settings state, so a clear from one task
/// is visible to the next read from any other.
#[derive(Clone)]
pub struct SessionStore {
    settings: Arc<SettingsStore>,
}

impl SessionStore {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }

    /// Starts a new session. Any state left from a previous session, including
    /// its anchor, is replaced in the same write.
    pub fn begin(&self, auth: AuthSession, anchor: Option<Coordinates>) -> Result<()> {
        self.settings.update(|s| {
            s.token = Some(auth.token);
            s.user = Some(auth.user);
            s.login_location = anchor;
        })?;
        info!(
            "Session started ({})",
            if anchor.is_some() {
                "anchored"
            } else {
                "no anchor"
            }
        );
        Ok(())
    }

    pub fn anchor(&self) -> Option<Coordinates> {
        self.settings.read_with(|s| s.login_location)
    }

    pub fn auth(&self) -> Option<AuthSession> {
        self.settings.read_with(|s| match (&s.token, &s.user) {
            (Some(token), Some(user)) => Some(AuthSession {
                token: token.clone(),
                user: user.clone(),
            }),
            _ => None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth().is_some()
    }

    /// Drops anchor, token and user together.
    pub fn clear(&self) -> Result<()> {
        self.settings.update(|s| {
            s.login_location = None;
            s.token = None;
            s.user = None;
        })
    }

    pub fn set_airport(&self, code: &str, name: &str) -> Result<()> {
        self.settings.update(|s| {
            s.airport_code = Some(code.to_string());
            s.airport_name = Some(name.to_string());
        })
    }

    /// Airport code and name remembered from registration.
    pub fn airport(&self) -> (Option<String>, Option<String>) {
        self.settings
            .read_with(|s| (s.airport_code.clone(), s.airport_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        (dir, SessionStore::new(Arc::new(settings)))
    }

    fn auth() -> AuthSession {
        AuthSession {
            token: "tok".into(),
            user: UserProfile {
                role: "USER".into(),
                extra: Default::default(),
            },
        }
    }

    #[test]
    fn clear_removes_session_but_keeps_airport() {
        let (_dir, session) = store();
        session.set_airport("DEL", "Indira Gandhi International Airport").unwrap();
        session
            .begin(auth(), Some(Coordinates::new(28.5562, 77.1)))
            .unwrap();
        assert!(session.is_authenticated());
        assert!(session.anchor().is_some());

        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.anchor(), None);
        assert_eq!(session.airport().0.as_deref(), Some("DEL"));
    }

    #[test]
    fn new_session_without_anchor_drops_the_old_one() {
        let (_dir, session) = store();
        session
            .begin(auth(), Some(Coordinates::new(1.0, 2.0)))
            .unwrap();
        session.begin(auth(), None).unwrap();
        assert_eq!(session.anchor(), None);
    }
}
