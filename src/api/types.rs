use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{AuthSession, UserProfile};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: String,
    pub airport_code: String,
    pub company: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegisterResponse {
    /// The backend signals success only through its message text.
    pub fn is_success(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("success"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoginUser {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// A login only counts when both a token and a user role came back.
    pub fn into_session(self) -> Option<AuthSession> {
        let token = self.token.filter(|t| !t.is_empty())?;
        let user = self.user?;
        let role = user.role.filter(|r| !r.is_empty())?;
        Some(AuthSession {
            token,
            user: UserProfile {
                role,
                extra: user.extra,
            },
        })
    }
}
