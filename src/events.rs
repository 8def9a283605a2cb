use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::{error::Alert, geofence::GeofenceStatus};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppEvent {
    /// Geofence violation; the UI must block on this notice and then call
    /// `acknowledge_session_end`.
    SessionEnded { alert: Alert },
    GeofenceStatusChanged { status: GeofenceStatus },
    DrainFinished { delivered: usize, remaining: usize },
}

/// Fan-out of app events to whatever UI layer is listening.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Nobody listening is not an error.
    pub fn emit(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            debug!("Dropped app event: no subscribers");
        }
    }
}
