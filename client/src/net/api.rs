//! REST helpers for talking to the relay server.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): the session check reports a failure, since cookies
//! only reach the endpoint from the browser.
//!
//! ERROR HANDLING
//! ==============
//! The session check never returns an error or panics. Every failure mode is
//! folded into a `SessionCheck` variant so auth state degrades to anonymous.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use crate::state::auth::SessionCheck;
#[cfg(feature = "hydrate")]
use super::types::SessionResponse;

/// Path of the server endpoint reporting the caller's session.
pub const SESSION_ENDPOINT: &str = "/api/auth/session";

#[cfg(any(test, feature = "hydrate"))]
fn session_decode_failed_message(err: &impl std::fmt::Display) -> String {
    format!("session response decode failed: {err}")
}

#[cfg(any(test, feature = "hydrate"))]
fn session_transport_failed_message(err: &impl std::fmt::Display) -> String {
    format!("session request failed: {err}")
}

/// Ask the server whether the browser holds a valid session.
///
/// Sends cookies (`credentials: include`) and bypasses the HTTP cache so a
/// focus refresh always observes the current session.
pub async fn check_session() -> SessionCheck {
    #[cfg(feature = "hydrate")]
    {
        use gloo_net::http::{Request, RequestCache, RequestCredentials};

        let resp = match Request::get(SESSION_ENDPOINT)
            .credentials(RequestCredentials::Include)
            .cache(RequestCache::NoStore)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return SessionCheck::Failed(session_transport_failed_message(&e)),
        };
        if !resp.ok() {
            return SessionCheck::Rejected(resp.status());
        }
        match resp.json::<SessionResponse>().await {
            Ok(body) => SessionCheck::Ok(body),
            Err(e) => SessionCheck::Failed(session_decode_failed_message(&e)),
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        SessionCheck::Failed("session check unavailable outside the browser".to_owned())
    }
}
