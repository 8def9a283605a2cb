use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use super::types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::{auth::AuthBackend, sync::SubmissionTransport};

const REGISTER_PATH: &str = "auth/register";
const LOGIN_PATH: &str = "auth/login";
const SUBMIT_PATH: &str = "survey/submit";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Cannot connect to {0}")]
    Connection(String),
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Talks JSON to the three backend endpoints under a configurable base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post_json(REGISTER_PATH, request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json(LOGIN_PATH, request).await
    }

    /// Posts an already-serialized survey body as-is. Any 2xx counts as
    /// delivered; the response body is not inspected.
    pub async fn submit_survey(&self, payload: &str) -> Result<(), ApiError> {
        let url = self.endpoint(SUBMIT_PATH);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Survey delivered to {url} ({status})");
        Ok(())
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        parse_body(response).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_connect() {
            ApiError::Connection(self.base_url.clone())
        } else {
            ApiError::Http(err)
        }
    }
}

/// Auth endpoints report refusals (bad password, duplicate email) in a JSON
/// body that may come with a 4xx status, so the body wins when it parses.
async fn parse_body<R: DeserializeOwned>(response: Response) -> Result<R, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    match serde_json::from_str(&text) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            body: text,
        }),
        Err(err) => Err(ApiError::Parse(err.to_string())),
    }
}

#[async_trait]
impl SubmissionTransport for ApiClient {
    async fn deliver(&self, payload: &str) -> anyhow::Result<()> {
        self.submit_survey(payload).await.map_err(anyhow::Error::new)
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        ApiClient::register(self, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        ApiClient::login(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ApiClient::new(
            "http://localhost:5000/api/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(SUBMIT_PATH),
            "http://localhost:5000/api/survey/submit"
        );
    }
}
