use std::sync::Arc;

use axum::http::{HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;

use super::*;
use crate::services::backend::BackendError;
use crate::state::test_helpers::{self, BrokenSessions, SpyBackend};

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn inbound(path: &str, pairs: &[(&str, &str)]) -> Inbound {
    Inbound { path: path.to_owned(), query: query(pairs), ..Inbound::default() }
}

fn with_bearer(mut inbound: Inbound, token: &str) -> Inbound {
    inbound
        .headers
        .insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
    inbound
}

fn with_body(mut inbound: Inbound, body: &Value) -> Inbound {
    inbound.body = Bytes::from(serde_json::to_vec(body).unwrap());
    inbound
}

fn spec(name: &str) -> &'static RelaySpec {
    table::find(name).unwrap()
}

async fn read(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// match_route
// =============================================================================

#[test]
fn match_route_captures_params() {
    let params = match_route("/api/sns/video/{video_id}/like", "/api/sns/video/v-42/like").unwrap();
    assert_eq!(params.get("video_id").map(String::as_str), Some("v-42"));
}

#[test]
fn match_route_rejects_literal_mismatch_and_length() {
    assert!(match_route("/api/sns/video/{video_id}/like", "/api/sns/video/v-42/share").is_none());
    assert!(match_route("/api/coupon/list", "/api/coupon/list/extra").is_none());
}

#[test]
fn match_route_ignores_trailing_slash() {
    assert_eq!(match_route("/api/coupon/list", "/api/coupon/list/"), Some(HashMap::new()));
}

// =============================================================================
// build_backend_target
// =============================================================================

#[test]
fn target_applies_query_defaults() {
    let target = build_backend_target(spec("coupon_list"), &HashMap::new(), &HashMap::new()).unwrap();
    assert_eq!(target, "/api/coupon/list?page=1&page_size=20");
}

#[test]
fn target_keeps_allow_list_order_and_drops_unknown_params() {
    let q = query(&[("page_size", "10"), ("page", "2"), ("is_active", "true"), ("debug", "1")]);
    let target = build_backend_target(spec("coupon_list"), &HashMap::new(), &q).unwrap();
    assert_eq!(target, "/api/coupon/list?page=2&page_size=10&is_active=true");
}

#[test]
fn target_treats_empty_value_as_absent() {
    let q = query(&[("page", ""), ("is_active", "")]);
    let target = build_backend_target(spec("coupon_list"), &HashMap::new(), &q).unwrap();
    assert_eq!(target, "/api/coupon/list?page=1&page_size=20");
}

#[test]
fn target_encodes_query_values() {
    let q = query(&[("limit", "5 & more")]);
    let target = build_backend_target(spec("feed"), &HashMap::new(), &q).unwrap();
    assert_eq!(target, "/api/recommendation/feed?limit=5+%26+more");
}

#[test]
fn target_substitutes_route_params() {
    let params = query(&[("video_id", "v-42")]);
    let target = build_backend_target(spec("video_like"), &params, &HashMap::new()).unwrap();
    assert_eq!(target, "/api/sns/video/v-42/like");
}

#[test]
fn target_substitutes_segment_with_default() {
    let get = build_backend_target(spec("monetization_get"), &HashMap::new(), &HashMap::new()).unwrap();
    assert_eq!(get, "/api/monetization/plan");
    let post = build_backend_target(spec("monetization_post"), &HashMap::new(), &HashMap::new()).unwrap();
    assert_eq!(post, "/api/monetization/subscribe");

    let q = query(&[("endpoint", "subscription")]);
    let chosen = build_backend_target(spec("monetization_get"), &HashMap::new(), &q).unwrap();
    assert_eq!(chosen, "/api/monetization/subscription");
}

#[test]
fn target_rejects_unsafe_segments() {
    for value in ["..", ".", "a/b"] {
        let q = query(&[("endpoint", value)]);
        let result = build_backend_target(spec("monetization_get"), &HashMap::new(), &q);
        assert!(matches!(result, Err(RelayError::BadRequest(_))), "{value:?} should be rejected");
    }
}

#[test]
fn target_empty_segment_falls_back_to_default() {
    let q = query(&[("endpoint", "")]);
    let target = build_backend_target(spec("monetization_get"), &HashMap::new(), &q).unwrap();
    assert_eq!(target, "/api/monetization/plan");
}

#[test]
fn target_encodes_segment_param() {
    let q = query(&[("endpoint", "plan?x=1")]);
    let target = build_backend_target(spec("monetization_get"), &HashMap::new(), &q).unwrap();
    assert_eq!(target, "/api/monetization/plan%3Fx%3D1");
}

#[test]
fn target_decodes_and_reencodes_route_params() {
    let params = query(&[("code", "%ED%95%9C%EA%B8%8010")]);
    let target = build_backend_target(spec("coupon_validate"), &params, &HashMap::new()).unwrap();
    assert_eq!(target, "/api/coupon/validate/%ED%95%9C%EA%B8%8010");

    let params = query(&[("code", "SPRING%20SALE")]);
    let target = build_backend_target(spec("coupon_validate"), &params, &HashMap::new()).unwrap();
    assert_eq!(target, "/api/coupon/validate/SPRING%20SALE");
}

#[test]
fn target_rejects_encoded_traversal_and_separators() {
    for raw in ["%2e%2e", "%2E", "a%2Fb", "%FF"] {
        let params = query(&[("code", raw)]);
        let result = build_backend_target(spec("coupon_validate"), &params, &HashMap::new());
        assert!(matches!(result, Err(RelayError::BadRequest(_))), "{raw:?} should be rejected");
    }
}

#[test]
fn target_missing_route_param_is_bad_request() {
    let result = build_backend_target(spec("project_get"), &HashMap::new(), &HashMap::new());
    assert!(matches!(result, Err(RelayError::BadRequest(_))));
}

// =============================================================================
// prepare_body
// =============================================================================

#[test]
fn body_ignored_when_policy_is_none() {
    assert_eq!(prepare_body(spec("video_like"), b"{\"x\":1}").unwrap(), None);
    assert_eq!(prepare_body(spec("video_like"), b"").unwrap(), None);
}

#[test]
fn body_must_be_json_when_declared() {
    assert!(matches!(prepare_body(spec("monetization_post"), b""), Err(RelayError::BadRequest(_))));
    assert!(matches!(prepare_body(spec("monetization_post"), b"plan=pro"), Err(RelayError::BadRequest(_))));
}

#[test]
fn body_reports_every_missing_field() {
    let body = serde_json::json!({ "name": "Project", "type": "" });
    let Err(RelayError::BadRequest(message)) = prepare_body(spec("project_save"), &serde_json::to_vec(&body).unwrap())
    else {
        panic!("expected bad request");
    };
    assert_eq!(message, "missing required fields: id, type");
}

#[test]
fn body_null_field_counts_as_missing() {
    let body = br#"{"code":null}"#;
    assert!(matches!(prepare_body(spec("coupon_use"), body), Err(RelayError::BadRequest(_))));
}

#[test]
fn body_forwarded_unchanged() {
    let body = serde_json::json!({ "id": "p-1", "type": "shortform", "steps": { "story": { "status": "pending" } } });
    let prepared = prepare_body(spec("project_save"), &serde_json::to_vec(&body).unwrap()).unwrap();
    assert_eq!(prepared, Some(body));
}

// =============================================================================
// forwarded_authorization
// =============================================================================

#[test]
fn authorization_forwarded_verbatim_unless_public() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
    assert_eq!(forwarded_authorization(spec("feed"), &headers).as_deref(), Some("Token abc"));
    assert_eq!(forwarded_authorization(spec("project_list"), &headers).as_deref(), Some("Token abc"));
    assert_eq!(forwarded_authorization(spec("trending"), &headers), None);
    assert_eq!(forwarded_authorization(spec("feed"), &HeaderMap::new()), None);
}

// =============================================================================
// relay
// =============================================================================

#[tokio::test]
async fn relay_coupon_list_round_trip() {
    let backend_body = serde_json::json!({ "success": true, "coupons": [{ "id": "c-1", "code": "WELCOME" }] });
    let backend = Arc::new(SpyBackend::replying(StatusCode::OK, backend_body.clone()));
    let state = test_helpers::test_app_state(backend.clone(), None);

    let request = with_bearer(inbound("/api/coupon/list", &[("page", "2"), ("page_size", "10")]), "tok");
    let (status, body) = read(relay(&state, spec("coupon_list"), request).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, backend_body);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::GET);
    assert_eq!(calls[0].target, "/api/coupon/list?page=2&page_size=10");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer tok"));
    assert_eq!(calls[0].body, None);
}

#[tokio::test]
async fn relay_passes_backend_error_status_through() {
    let backend_body = serde_json::json!({ "detail": "Coupon code already exists" });
    let backend = Arc::new(SpyBackend::replying(StatusCode::CONFLICT, backend_body.clone()));
    let state = test_helpers::test_app_state(backend.clone(), None);

    let body = serde_json::json!({ "code": "DUP", "name": "Dup", "type": "discount", "value": 10 });
    let request = with_body(with_bearer(inbound("/api/coupon/create", &[]), "tok"), &body);
    let (status, relayed) = read(relay(&state, spec("coupon_create"), request).await).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(relayed, backend_body);
    assert_eq!(backend.calls()[0].body, Some(body));
}

#[tokio::test]
async fn relay_bearer_route_without_token_still_calls_backend() {
    let backend = Arc::new(SpyBackend::replying(
        StatusCode::UNAUTHORIZED,
        serde_json::json!({ "detail": "Not authenticated" }),
    ));
    let state = test_helpers::test_app_state(backend.clone(), None);

    let (status, _) = read(relay(&state, spec("my_coupons"), inbound("/api/coupon/my-coupons", &[])).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization, None);
}

#[tokio::test]
async fn relay_session_route_without_session_is_401_without_backend_call() {
    let backend = Arc::new(SpyBackend::new());
    let state = test_helpers::test_app_state(backend.clone(), None);

    for name in ["project_list", "project_get", "project_delete"] {
        let path = if name == "project_list" {
            "/api/allinone-studio/project"
        } else {
            "/api/allinone-studio/project/p-1"
        };
        let (status, body) = read(relay(&state, spec(name), with_bearer(inbound(path, &[]), "tok")).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{name}");
        assert_eq!(body, serde_json::json!({ "error": error::UNAUTHORIZED_MESSAGE }));
    }
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn relay_session_checked_before_body_validation() {
    let backend = Arc::new(SpyBackend::new());
    let state = test_helpers::test_app_state(backend.clone(), None);

    let request = with_body(inbound("/api/allinone-studio/project", &[]), &serde_json::json!({}));
    let (status, _) = read(relay(&state, spec("project_save"), request).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn relay_session_route_with_session_forwards() {
    let backend = Arc::new(SpyBackend::replying(
        StatusCode::OK,
        serde_json::json!({ "success": true, "project": { "id": "p-1" } }),
    ));
    let state = test_helpers::test_app_state(backend.clone(), Some(test_helpers::dummy_session()));

    let request = with_bearer(inbound("/api/allinone-studio/project/p-1", &[]), "tok");
    let (status, body) = read(relay(&state, spec("project_get"), request).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["id"], "p-1");
    let calls = backend.calls();
    assert_eq!(calls[0].target, "/api/allinone-studio/project/p-1");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn relay_missing_mandatory_field_is_400_without_backend_call() {
    let backend = Arc::new(SpyBackend::new());
    let state = test_helpers::test_app_state(backend.clone(), Some(test_helpers::dummy_session()));

    let request = with_body(
        inbound("/api/allinone-studio/project", &[]),
        &serde_json::json!({ "type": "shortform", "name": "No id" }),
    );
    let (status, body) = read(relay(&state, spec("project_save"), request).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "missing required fields: id");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn relay_transport_failure_is_500_with_route_message() {
    let backend = Arc::new(SpyBackend::failing(BackendError::Transport("connection refused".into())));
    let state = test_helpers::test_app_state(backend.clone(), None);

    let (status, body) = read(relay(&state, spec("timeline"), inbound("/api/sns/timeline", &[])).await).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "success": false, "error": "Failed to fetch timeline" }));
    assert_eq!(backend.calls()[0].target, "/api/sns/timeline?page=1&page_size=20");
}

#[tokio::test]
async fn relay_malformed_backend_body_is_500() {
    let backend = Arc::new(SpyBackend::failing(BackendError::Decode { status: 502, message: "html".into() }));
    let state = test_helpers::test_app_state(backend, None);

    let (status, body) =
        read(relay(&state, spec("trending"), inbound("/api/recommendation/trending", &[])).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch trending videos");
}

#[tokio::test]
async fn relay_session_check_failure_is_500_without_backend_call() {
    let backend = Arc::new(SpyBackend::new());
    let state = AppState::new(backend.clone(), Arc::new(BrokenSessions));

    let (status, body) =
        read(relay(&state, spec("project_list"), inbound("/api/allinone-studio/project", &[])).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to load projects");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn relay_unlike_uses_delete_and_path_param() {
    let backend = Arc::new(SpyBackend::new());
    let state = test_helpers::test_app_state(backend.clone(), None);

    let request = with_bearer(inbound("/api/sns/video/v-9/like", &[]), "tok");
    let (status, _) = read(relay(&state, spec("video_unlike"), request).await).await;

    assert_eq!(status, StatusCode::OK);
    let calls = backend.calls();
    assert_eq!(calls[0].method, Method::DELETE);
    assert_eq!(calls[0].target, "/api/sns/video/v-9/like");
}

// =============================================================================
// Inbound
// =============================================================================

#[test]
fn inbound_from_request_splits_path_and_query() {
    let uri: Uri = "/api/coupon/list?page=3&is_active=false".parse().unwrap();
    let inbound = Inbound::from_request(&uri, HeaderMap::new(), Bytes::new());
    assert_eq!(inbound.path, "/api/coupon/list");
    assert_eq!(inbound.query.get("page").map(String::as_str), Some("3"));
    assert_eq!(inbound.query.get("is_active").map(String::as_str), Some("false"));
}

#[test]
fn inbound_from_request_keeps_first_repeated_key() {
    let uri: Uri = "/api/coupon/list?page=2&page=5&is_active=a%20b".parse().unwrap();
    let inbound = Inbound::from_request(&uri, HeaderMap::new(), Bytes::new());
    assert_eq!(inbound.query.get("page").map(String::as_str), Some("2"));
    assert_eq!(inbound.query.get("is_active").map(String::as_str), Some("a b"));
}

#[test]
fn inbound_from_request_without_query_is_empty() {
    let uri: Uri = "/api/sns/timeline".parse().unwrap();
    assert!(Inbound::from_request(&uri, HeaderMap::new(), Bytes::new()).query.is_empty());
}
