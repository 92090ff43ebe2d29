//! Session-gated request relay.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every browser-facing `/api/...` route except the session check is a relay:
//! authorize, translate into exactly one backend call, and hand the backend's
//! status and JSON body back unchanged. Behavior differences between routes
//! live entirely in the `RelaySpec` table; this module holds the one generic
//! pipeline that interprets it.
//!
//! ERROR HANDLING
//! ==============
//! Only three outcomes are synthesized locally: 401 (session required but
//! absent), 400 (request cannot be forwarded) and 500 (the outbound call
//! failed). Everything else is the backend's own answer.

pub mod error;
pub mod table;

use std::borrow::Cow;
use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;

pub use error::RelayError;
pub use table::{AuthPolicy, BodyPolicy, QueryParam, RelaySpec};

use crate::services::backend::{BackendRequest, BackendResponse};
use crate::state::AppState;

/// The parts of an inbound request a relay needs.
#[derive(Debug, Clone, Default)]
pub struct Inbound {
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Inbound {
    /// Split an Axum request into relay inputs. A repeated query key keeps
    /// its first value.
    #[must_use]
    pub fn from_request(uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let mut query = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
            query.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { path: uri.path().to_owned(), query, headers, body }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Run one relay invocation and render the result as an HTTP response.
pub async fn relay(state: &AppState, spec: &'static RelaySpec, inbound: Inbound) -> Response {
    match forward(state, spec, inbound).await {
        Ok(response) => {
            tracing::debug!(route = spec.name, status = response.status.as_u16(), "relayed");
            (response.status, Json(response.body)).into_response()
        }
        Err(e) => {
            if let RelayError::Upstream { .. } = e {
                tracing::error!(route = spec.name, error = %e, "relay call failed");
            } else {
                tracing::debug!(route = spec.name, status = e.status().as_u16(), error = %e, "relay rejected locally");
            }
            e.into_response()
        }
    }
}

async fn forward(state: &AppState, spec: &'static RelaySpec, inbound: Inbound) -> Result<BackendResponse, RelayError> {
    if spec.auth == AuthPolicy::Session {
        let session = state
            .sessions
            .verify(&inbound.headers)
            .await
            .map_err(|e| RelayError::Upstream { message: spec.failure_message, source: e.into() })?;
        let Some(session) = session else {
            return Err(RelayError::Unauthorized);
        };
        tracing::debug!(route = spec.name, user_id = %session.user_id, "session verified");
    }

    let params = match_route(spec.route, &inbound.path).unwrap_or_default();
    let target = build_backend_target(spec, &params, &inbound.query)?;
    let body = prepare_body(spec, &inbound.body)?;

    let request = BackendRequest::new(spec.method.method(), target)
        .with_authorization(forwarded_authorization(spec, &inbound.headers))
        .with_body(body);

    state
        .backend
        .send(request)
        .await
        .map_err(|e| RelayError::Upstream { message: spec.failure_message, source: e.into() })
}

// =============================================================================
// REQUEST CONSTRUCTION
// =============================================================================

/// Match `path` against a `{param}` route template, capturing parameters.
#[must_use]
pub fn match_route(template: &str, path: &str) -> Option<HashMap<String, String>> {
    let template_segments: Vec<&str> = template.trim_end_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in template_segments.iter().zip(&path_segments) {
        match placeholder(expected) {
            Some(name) => {
                params.insert(name.to_owned(), (*actual).to_owned());
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

/// Build the backend path and query string for one invocation.
pub fn build_backend_target(
    spec: &RelaySpec,
    params: &HashMap<String, String>,
    query: &HashMap<String, String>,
) -> Result<String, RelayError> {
    let mut target = String::new();
    for segment in spec.backend_path.split('/').skip(1) {
        target.push('/');
        let Some(name) = placeholder(segment) else {
            target.push_str(segment);
            continue;
        };

        // Route params arrive percent-encoded from the URI path; segment
        // params come from the already-decoded query string.
        let value: Cow<'_, str> = match params.get(name) {
            Some(raw) => urlencoding::decode(raw)
                .map_err(|_| RelayError::BadRequest(format!("invalid {name}: {raw:?}")))?,
            None => spec
                .segments
                .iter()
                .find(|p| p.name == name)
                .and_then(|p| query_value(query, p))
                .map(Cow::Borrowed)
                .ok_or_else(|| RelayError::BadRequest(format!("missing path parameter: {name}")))?,
        };
        if !is_safe_segment(&value) {
            return Err(RelayError::BadRequest(format!("invalid {name}: {value:?}")));
        }
        target.push_str(&urlencoding::encode(&value));
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut appended = false;
    for param in spec.query {
        if let Some(value) = query_value(query, param) {
            serializer.append_pair(param.name, value);
            appended = true;
        }
    }
    if appended {
        target.push('?');
        target.push_str(&serializer.finish());
    }
    Ok(target)
}

/// Caller-supplied value for an allow-listed parameter, else its default.
/// An empty value counts as absent.
fn query_value<'a>(query: &'a HashMap<String, String>, param: &QueryParam) -> Option<&'a str> {
    query
        .get(param.name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .or(param.default)
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

/// A decoded value that stays exactly one path segment once re-encoded.
fn is_safe_segment(value: &str) -> bool {
    !value.is_empty() && value != "." && value != ".." && !value.contains('/')
}

/// Parse and validate the inbound body per the route's `BodyPolicy`.
pub fn prepare_body(spec: &RelaySpec, bytes: &[u8]) -> Result<Option<Value>, RelayError> {
    let BodyPolicy::Json { required } = spec.body else {
        return Ok(None);
    };

    let body: Value = serde_json::from_slice(bytes)
        .map_err(|_| RelayError::BadRequest("request body must be valid JSON".to_owned()))?;

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| is_missing(body.get(*field)))
        .collect();
    if !missing.is_empty() {
        return Err(RelayError::BadRequest(format!("missing required fields: {}", missing.join(", "))));
    }
    Ok(Some(body))
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// The `Authorization` value to send upstream, copied verbatim.
#[must_use]
pub fn forwarded_authorization(spec: &RelaySpec, headers: &HeaderMap) -> Option<String> {
    if spec.auth == AuthPolicy::Public {
        return None;
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
