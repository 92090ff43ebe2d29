//! Session verification. Resolves an inbound credential to a user.
//!
//! ARCHITECTURE
//! ============
//! The relay never owns sessions. A credential arrives either as an
//! `Authorization` header or as the `session_token` cookie set by the login
//! flow, and the backend's session-check path is the authority on whether it
//! is still valid.
//!
//! TRADE-OFFS
//! ==========
//! Every non-2xx answer from the backend maps to "no session". Only a
//! transport failure surfaces as an error, so a flaky backend yields a 500
//! rather than a spurious 401.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

use super::backend::{Backend, BackendError, BackendRequest};

pub const COOKIE_NAME: &str = "session_token";

/// Server-attested proof that a request comes from an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "id", deserialize_with = "deserialize_id")]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_owned()
}

/// Backend user ids may be numeric or strings; normalize to a string.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid user id: {other}"))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session check failed: {0}")]
    Backend(#[from] BackendError),
}

#[async_trait::async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Return the caller's session, or `None` when there is no valid one.
    async fn verify(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
}

/// Extract the caller's credential as an `Authorization` header value.
///
/// The header wins over the cookie; a bare cookie token becomes `Bearer <token>`.
#[must_use]
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(value) = header {
        return Some(value.to_owned());
    }

    let jar = CookieJar::from_headers(headers);
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|token| !token.is_empty())
        .map(|token| format!("Bearer {token}"))
}

/// Verifies sessions by asking the backend who the credential belongs to.
pub struct BackendSessionVerifier {
    backend: Arc<dyn Backend>,
    check_path: String,
}

impl BackendSessionVerifier {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, check_path: impl Into<String>) -> Self {
        Self { backend, check_path: check_path.into() }
    }
}

#[async_trait::async_trait]
impl SessionVerifier for BackendSessionVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let Some(credential) = credential_from_headers(headers) else {
            return Ok(None);
        };

        let request = BackendRequest::new(Method::GET, self.check_path.clone()).with_authorization(Some(credential));
        let response = match self.backend.send(request).await {
            Ok(response) => response,
            // A non-JSON rejection page still means "not authenticated".
            Err(BackendError::Decode { status, .. }) if status >= 400 => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !response.status.is_success() {
            tracing::debug!(status = response.status.as_u16(), "session check rejected credential");
            return Ok(None);
        }

        match serde_json::from_value::<Session>(response.body) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "session check returned an unrecognized user payload");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
