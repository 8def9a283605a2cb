//! Survey content as posted to `/survey/submit`.
//!
//! Once serialized the payload is opaque to the queue and the store; these types
//! only exist so the form layer has something typed to fill in.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const TRIP_REASONS: [&str; 3] = ["Business", "Leisure", "Other"];

pub const TRAVEL_CLASSES: [&str; 4] = ["First Class", "Business", "Economy", "Tourist"];

pub const RETURN_TRIP_BUCKETS: [&str; 5] = ["1–2", "3–5", "6–10", "11–20", "21+"];

pub const SURVEY_QUESTIONS: [&str; 6] = [
    "Experience at parking facility",
    "Experience at check-in",
    "Cleanliness of washrooms",
    "Experience at security check",
    "Were F&B and retail facilities as per expectation?",
    "Experience at boarding gate",
];

pub const RATING_LABELS: [&str; 5] = ["Excellent", "Very Good", "Good", "Fair", "Poor"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurveyPayload {
    pub airport_name: String,
    pub airport_code: String,
    pub destination: String,
    pub trip_reason: String,
    pub travel_class: String,
    pub return_trips: String,
    /// Question text → rating label.
    pub ratings: BTreeMap<String, String>,
    pub additional_feedback: String,
    pub submitted_at: String,
}

impl SurveyPayload {
    /// Stamps the submission time in the same millisecond RFC 3339 form the
    /// backend already stores.
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.submitted_at = at.to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize survey payload")
    }
}
