//! HTTP adapter implementation for the portal's authentication endpoints.
//!
//! This file contains the concrete implementation of the `AuthApi` trait over
//! `reqwest`, including the client wrapper, endpoint configuration and the
//! conversion of HTTP failures into [`AdapterError`]s.

use crate::errors::AdapterError;
use crate::models::{AuthResponse, LoginRequest, UserPayload, WhoAmIBody};
use crate::AuthApi;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Endpoint configuration for [`HttpAuthApi`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpAuthConfig {
    /// Base URL of the REST API, e.g. `https://desk.example.com/api`.
    pub base_url: String,
    pub login_path: String,
    pub whoami_path: String,
    pub logout_path: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpAuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            login_path: "/auth/login".to_string(),
            whoami_path: "/auth/me".to_string(),
            logout_path: "/auth/logout".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpAuthConfig {
    /// Joins the base URL and an endpoint path with exactly one slash.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// `AuthApi` over HTTP with bearer-token authentication.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    config: HttpAuthConfig,
}

impl HttpAuthApi {
    pub fn new(config: HttpAuthConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| AdapterError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpAuthConfig {
        &self.config
    }

    /// Passes successful responses through and converts the rest to errors.
    async fn check(response: Response) -> Result<Response, AdapterError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AdapterError::from_status(
            status.as_u16(),
            error_message(&body, status.canonical_reason().unwrap_or("request failed")),
        ))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AdapterError> {
        let url = self.config.url(&self.config.login_path);
        debug!(%url, email = %request.email, "posting login");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        Self::check(response)
            .await?
            .json::<AuthResponse>()
            .await
            .map_err(|err| AdapterError::Decode(err.to_string()))
    }

    async fn whoami(&self, token: &str) -> Result<UserPayload, AdapterError> {
        let url = self.config.url(&self.config.whoami_path);
        debug!(%url, "verifying identity");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        Self::check(response)
            .await?
            .json::<WhoAmIBody>()
            .await
            .map(WhoAmIBody::into_user)
            .map_err(|err| AdapterError::Decode(err.to_string()))
    }

    async fn logout(&self, token: &str) -> Result<(), AdapterError> {
        let url = self.config.url(&self.config.logout_path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        Self::check(response).await.map(|_| ())
    }
}

/// Extracts a human-readable message from an error body.
///
/// Looks at the `message` and then the `error` field of a JSON object; a
/// non-JSON body is used verbatim, and an empty one falls back to `fallback`.
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    let body = body.trim();
    if body.is_empty() {
        return fallback.to_string();
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .message
            .or(parsed.error)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let config = HttpAuthConfig {
            base_url: "https://desk.example.com/api/".to_string(),
            ..HttpAuthConfig::default()
        };
        assert_eq!(
            config.url("/auth/login"),
            "https://desk.example.com/api/auth/login"
        );
        assert_eq!(config.url("auth/me"), "https://desk.example.com/api/auth/me");
    }

    #[test]
    fn error_message_prefers_message_field() {
        let body = r#"{"message":"Invalid credentials","error":"auth"}"#;
        assert_eq!(error_message(body, "Unauthorized"), "Invalid credentials");
    }

    #[test]
    fn error_message_falls_back_to_error_field() {
        assert_eq!(
            error_message(r#"{"error":"Token expired"}"#, "Unauthorized"),
            "Token expired"
        );
    }

    #[test]
    fn error_message_handles_plain_and_empty_bodies() {
        assert_eq!(error_message("Bad Gateway", "x"), "Bad Gateway");
        assert_eq!(error_message("   ", "Service Unavailable"), "Service Unavailable");
        assert_eq!(error_message("{}", "Unauthorized"), "Unauthorized");
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: HttpAuthConfig =
            serde_json::from_str(r#"{"base_url":"https://desk.example.com"}"#).unwrap();
        assert_eq!(config.whoami_path, "/auth/me");
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let api = HttpAuthApi::new(HttpAuthConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..HttpAuthConfig::default()
        })
        .unwrap();

        let err = api.whoami("token").await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)), "got: {err:?}");
    }
}
