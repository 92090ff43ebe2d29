//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the relay table, the session-check endpoint and the
//! Leptos SSR app under a single Axum router. Relay routes are generated from
//! `relay::table::RELAY_ROUTES`; several specs may share one path with
//! different methods, so handlers are grouped per path before registration.

pub mod auth;

use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::routing::{MethodRouter, get};
use leptos::prelude::*;
use leptos_axum::{LeptosRoutes, generate_route_list};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::relay::{self, Inbound, RelaySpec, table::RELAY_ROUTES};
use crate::state::AppState;

/// API routes: every relay spec, the session check, and health.
pub fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    relay_routes(RELAY_ROUTES)
        .route("/api/auth/session", get(auth::session))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One Axum route per distinct relay path, one method handler per spec.
pub(crate) fn relay_routes(specs: &'static [RelaySpec]) -> Router<AppState> {
    let mut by_path: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
    for spec in specs {
        let methods = by_path.remove(spec.route).unwrap_or_else(MethodRouter::new);
        let handler = move |State(state): State<AppState>, uri: Uri, headers: HeaderMap, body: Bytes| async move {
            relay_handler(&state, spec, &uri, headers, body).await
        };
        by_path.insert(spec.route, methods.on(spec.method.filter(), handler));
    }

    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, methods)| router.route(path, methods))
}

async fn relay_handler(state: &AppState, spec: &'static RelaySpec, uri: &Uri, headers: HeaderMap, body: Bytes) -> Response {
    relay::relay(state, spec, Inbound::from_request(uri, headers, body)).await
}

/// Leptos SSR frontend: API routes + SSR pages + `/pkg` assets.
///
/// # Errors
///
/// Returns an error if the Leptos configuration cannot be loaded (missing
/// `LEPTOS_OUTPUT_NAME` and no `[package.metadata.leptos]` section).
pub fn leptos_app(state: AppState) -> Result<Router, String> {
    let conf = get_configuration(None).map_err(|e| format!("leptos configuration: {e}"))?;
    let leptos_options = conf.leptos_options;
    let routes = generate_route_list(client::app::App);

    let leptos_router = Router::new()
        .leptos_routes(&leptos_options, routes, {
            let opts = leptos_options.clone();
            move || client::app::shell(opts.clone())
        })
        .with_state(leptos_options.clone());

    // Serve Leptos static assets (WASM, CSS, JS) from the site root /pkg directory.
    let site_root_path = PathBuf::from(leptos_options.site_root.as_ref());

    Ok(api_routes(state)
        .merge(leptos_router)
        .nest_service("/pkg", ServeDir::new(site_root_path.join("pkg"))))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
