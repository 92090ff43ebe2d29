//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds only the two collaborators every relay call needs: the backend
//! client and the session verifier. No per-request state survives a call.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::services::backend::{Backend, BackendError, HttpBackend};
use crate::services::session::{BackendSessionVerifier, SessionVerifier};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; both collaborators are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, sessions: Arc<dyn SessionVerifier>) -> Self {
        Self { backend, sessions }
    }

    /// Wire the HTTP backend and a backend-backed session verifier from config.
    pub fn from_config(config: &RelayConfig) -> Result<Self, BackendError> {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(config.backend_url.clone())?);
        let sessions = Arc::new(BackendSessionVerifier::new(backend.clone(), config.session_check_path.clone()));
        Ok(Self::new(backend, sessions))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
