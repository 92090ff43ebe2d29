//! Session-check endpoint polled by the client auth state machine.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::Serialize;

use crate::services::session::Session;
use crate::state::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

/// Read-only projection of the session handed to the browser.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl From<Session> for SessionStatus {
    fn from(session: Session) -> Self {
        Self {
            authenticated: true,
            user: Some(SessionUser { id: session.user_id, email: session.email, role: session.role }),
        }
    }
}

impl SessionStatus {
    #[must_use]
    pub fn anonymous() -> Self {
        Self { authenticated: false, user: None }
    }
}

/// `GET /api/auth/session`: report whether the caller has a valid session.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Json<SessionStatus>) {
    match state.sessions.verify(&headers).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session.into())),
        Ok(None) => (StatusCode::OK, Json(SessionStatus::anonymous())),
        Err(e) => {
            tracing::warn!(error = %e, "session check unavailable");
            (StatusCode::BAD_GATEWAY, Json(SessionStatus::anonymous()))
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
