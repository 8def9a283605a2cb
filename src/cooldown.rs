use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::warn;

use crate::{error::SurveyError, settings::SettingsStore, utils::clock::Clock};

pub const COOLDOWN_DURATION: Duration = Duration::from_secs(120);

/// Minimum spacing between accepted survey submissions. The last accepted
/// timestamp lives in the settings file, so the window survives restarts.
#[derive(Clone)]
pub struct CooldownGate {
    settings: Arc<SettingsStore>,
    clock: Arc<dyn Clock>,
    duration: Duration,
}

impl CooldownGate {
    pub fn new(settings: Arc<SettingsStore>, clock: Arc<dyn Clock>, duration: Duration) -> Self {
        Self {
            settings,
            clock,
            duration,
        }
    }

    pub fn remaining(&self) -> Duration {
        let now = self.clock.now();
        match self.settings.update(|s| {
            clamp_to_now(&mut s.last_submit_at, now);
            s.last_submit_at
        }) {
            Ok(last) => remaining_at(last, now, self.duration),
            Err(err) => {
                warn!("Could not rewrite future cooldown stamp: {err:#}");
                self.duration
            }
        }
    }

    /// Accepts a submission if the window has passed and stamps it. The stamp
    /// is written before any delivery happens, so a failed delivery still
    /// consumes the window.
    pub fn try_accept(&self) -> Result<DateTime<Utc>, SurveyError> {
        let now = self.clock.now();
        let duration = self.duration;
        self.settings
            .update(|s| {
                clamp_to_now(&mut s.last_submit_at, now);
                let remaining = remaining_at(s.last_submit_at, now, duration);
                if remaining.is_zero() {
                    s.last_submit_at = Some(now);
                    Ok(now)
                } else {
                    Err(remaining)
                }
            })?
            .map_err(|remaining| SurveyError::Cooldown { remaining })
    }
}

/// A stamp from the future means the clock moved backwards. It becomes `now`,
/// so the window restarts instead of lasting until the old time comes round.
fn clamp_to_now(last: &mut Option<DateTime<Utc>>, now: DateTime<Utc>) {
    if last.is_some_and(|stamp| stamp > now) {
        *last = Some(now);
    }
}

fn remaining_at(last: Option<DateTime<Utc>>, now: DateTime<Utc>, duration: Duration) -> Duration {
    let Some(last) = last else {
        return Duration::ZERO;
    };
    let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
    duration.saturating_sub(elapsed)
}
