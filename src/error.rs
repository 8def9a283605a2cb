use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;

/// Failures surfaced to the user-facing flows (login, registration, manual
/// submit). Background flows log instead of returning these.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// A required field or precondition is missing; nothing was sent or stored.
    #[error("{0}")]
    Validation(String),

    #[error("Please wait {} before submitting again", format_remaining(.remaining))]
    Cooldown { remaining: Duration },

    #[error("{0}")]
    Permission(String),

    #[error(transparent)]
    Network(#[from] ApiError),

    /// The backend answered but refused the request.
    #[error("{0}")]
    Rejected(String),

    #[error("local storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Blocking notice shown to the user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl SurveyError {
    pub fn alert(&self) -> Alert {
        let title = match self {
            SurveyError::Validation(_) | SurveyError::Rejected(_) | SurveyError::Storage(_) => {
                "Error"
            }
            SurveyError::Cooldown { .. } => "Please wait",
            SurveyError::Permission(_) => "Permission denied",
            SurveyError::Network(_) => "Server error",
        };
        Alert::new(title, self.to_string())
    }
}

impl From<SurveyError> for Alert {
    fn from(err: SurveyError) -> Self {
        err.alert()
    }
}

/// `m:ss`, as shown under the submit button.
pub fn format_remaining(remaining: &Duration) -> String {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    format!("{}:{:02}", secs / 60, secs % 60)
}
