mod config;
mod relay;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    let config = match config::RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let state = match state::AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "backend client init failed");
            std::process::exit(1);
        }
    };

    // Serve the SSR client when Leptos is configured; fall back to API-only.
    let app = match routes::leptos_app(state.clone()) {
        Ok(app) => app,
        Err(e) => {
            tracing::warn!(error = %e, "Leptos not configured, serving API routes only");
            routes::api_routes(state)
        }
    };

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(port = config.port, backend = %config.backend_url, "relay listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
