//! API client for the LegalDocs backend.
//!
//! This module provides the `ApiClient` struct, an `Authenticator` that
//! verifies credentials against the remote service instead of the demo rules.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;
use crate::auth::{AuthError, Authenticator, Credentials, Registration, Role, Session};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the backend API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Session-shaped payload returned by `/login` and `/register`.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    id: serde_json::Value,
    #[serde(alias = "emailAddress")]
    email: String,
    role: Role,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session, ApiError> {
        let id = match self.id {
            serde_json::Value::String(s) if !s.is_empty() => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(ApiError::InvalidResponse(format!(
                    "Unusable session id: {}",
                    other
                )))
            }
        };
        Ok(Session::new(id, self.email, self.role, self.name.as_deref()))
    }
}

/// API client for the LegalDocs backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_auth<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Session, ApiError> {
        let url = self.url(path);
        debug!(%url, "Sending auth request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &text));
        }

        parse_session(&text)
    }
}

/// Parse a `/login` or `/register` response body into a session.
fn parse_session(body: &str) -> Result<Session, ApiError> {
    let payload: AuthResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse auth response: {}", e)))?;
    payload.into_session()
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = LoginRequest {
            email: &credentials.email_address,
            password: &credentials.password,
        };
        Ok(self.post_auth("login", &body).await?)
    }

    async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        let body = RegisterRequest {
            email: &registration.email_address,
            password: &registration.password,
            name: registration.display_name.as_deref(),
        };
        Ok(self.post_auth("register", &body).await?)
    }
}
