//! Rows of the offline submission queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One queued survey submission.
///
/// `payload` is the serialized survey exactly as it will be posted; the store
/// never rewrites it. `synced` only ever moves from `false` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: u64,
    pub payload: String,
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCounts {
    pub synced: u64,
    pub unsynced: u64,
}
