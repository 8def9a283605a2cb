//! Offline submission pipeline: the queue, the connectivity oracle it
//! consults, and the background loop that drains it on reconnect.

pub mod connectivity;
pub mod controller;
pub mod loop_worker;
pub mod queue;

use anyhow::Result;
use async_trait::async_trait;

pub use connectivity::{ConnectivityMonitor, ConnectivityOracle};
pub use controller::SyncController;
pub use queue::{DeliveryMode, DrainOutcome, SubmissionQueue, SubmitOutcome};

/// Delivers one serialized survey to the backend.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn deliver(&self, payload: &str) -> Result<()>;
}
