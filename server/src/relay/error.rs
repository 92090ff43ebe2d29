//! Locally synthesized relay failures and their JSON envelopes.
//!
//! Backend non-2xx answers are not errors here; they pass through untouched.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::services::backend::BackendError;
use crate::services::session::SessionError;

pub const UNAUTHORIZED_MESSAGE: &str = "Authentication required.";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No verified session on a route that enforces one.
    #[error("unauthorized")]
    Unauthorized,

    /// The inbound request cannot be forwarded as-is.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The outbound call (or the session check guarding it) failed.
    #[error("{message}: {source}")]
    Upstream { message: &'static str, source: UpstreamFailure },
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamFailure {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl RelayError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Unauthorized => serde_json::json!({ "error": UNAUTHORIZED_MESSAGE }),
            Self::BadRequest(message) => serde_json::json!({ "success": false, "error": message }),
            Self::Upstream { message, .. } => serde_json::json!({ "success": false, "error": message }),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
