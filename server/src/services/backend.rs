//! Backend service client: one JSON-over-HTTP call per relay invocation.
//!
//! DESIGN
//! ======
//! Relay handlers depend on the `Backend` trait rather than `reqwest`
//! directly so route tests can swap in a recording double and assert whether
//! the backend was contacted at all.

use axum::http::{Method, StatusCode};
use serde_json::Value;

/// An outbound call against the backend service.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    /// Path plus optional query string, e.g. `/api/coupon/list?page=1`.
    pub target: String,
    /// Value for the outbound `Authorization` header, if any.
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl BackendRequest {
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self { method, target: target.into(), authorization: None, body: None }
    }

    #[must_use]
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }
}

/// Backend status and parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response (connect, TLS, reset).
    #[error("backend request failed: {0}")]
    Transport(String),

    /// The backend answered with a body that is not JSON.
    #[error("backend response parse failed (status {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, BackendError>;
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

/// `reqwest`-backed implementation addressed by a configurable base URL.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client for `base_url` (no trailing slash). No retry and no
    /// timeout override beyond the `reqwest` defaults.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.into() })
    }

    #[must_use]
    pub fn url_for(&self, target: &str) -> String {
        format!("{}{target}", self.base_url)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        let mut builder = self
            .http
            .request(request.method, self.url_for(&request.target))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(authorization) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let body = parse_body(status, &bytes)?;
        Ok(BackendResponse { status, body })
    }
}

/// Decode a backend body as JSON, keeping the status for diagnostics.
pub(crate) fn parse_body(status: StatusCode, bytes: &[u8]) -> Result<Value, BackendError> {
    serde_json::from_slice(bytes).map_err(|e| BackendError::Decode { status: status.as_u16(), message: e.to_string() })
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
