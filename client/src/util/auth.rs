//! Shared auth store and route-guard decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthStore` is the single authoritative auth state per browser tab,
//! provided as Leptos context by `App`. Refresh triggers are the initial
//! mount, window focus, and explicit calls from pages. Route components
//! consult `guard_decision` so redirect behavior is identical everywhere.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;

use crate::net::api::check_session;
use crate::state::auth::{AuthState, RefreshSequencer, SessionCheck};

/// Where an authenticated user lands when sent away from a guest-only route.
pub const DEFAULT_LANDING: &str = "/";
/// Where an anonymous user is sent from a protected route.
pub const DEFAULT_LOGIN: &str = "/login";

// =============================================================
// Store
// =============================================================

/// Reactive auth state plus the sequencer that orders refreshes.
#[derive(Clone, Copy)]
pub struct AuthStore {
    state: RwSignal<AuthState>,
    sequencer: StoredValue<RefreshSequencer>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    /// Create a store in the loading state.
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(AuthState::default()),
            sequencer: StoredValue::new(RefreshSequencer::default()),
        }
    }

    pub fn state(&self) -> ReadSignal<AuthState> {
        self.state.read_only()
    }

    /// Re-check the session against the server.
    pub async fn refresh(self) {
        self.refresh_with(check_session()).await;
    }

    /// Await `check` and replace the state with its answer.
    ///
    /// Only the first refresh is observed as loading; later ones update in
    /// place. The ticket is taken when this future is first polled, and the
    /// answer is discarded if another refresh started after that. Resolves
    /// once the answer is applied or discarded.
    pub async fn refresh_with<F>(self, check: F)
    where
        F: Future<Output = SessionCheck>,
    {
        let Some(ticket) = self.sequencer.try_update_value(RefreshSequencer::begin) else {
            return;
        };
        let check = check.await;
        if let Some(message) = unsuccessful_check_message(&check) {
            #[cfg(feature = "hydrate")]
            log::warn!("auth: {message}");
            #[cfg(not(feature = "hydrate"))]
            let _ = message;
        }

        let next = AuthState::resolve(check);
        let current = self.sequencer.try_with_value(|seq| seq.accept(ticket)).unwrap_or(false);
        if current {
            self.state.try_set(next);
        } else {
            #[cfg(feature = "hydrate")]
            log::debug!("auth: discarded stale session answer");
        }
    }

    /// Fire-and-forget refresh for event handlers.
    pub fn spawn_refresh(self) {
        leptos::task::spawn_local(self.refresh());
    }

    /// Re-validate the session whenever the window regains focus.
    pub fn install_focus_refresh(self) {
        #[cfg(feature = "hydrate")]
        {
            let handle = window_event_listener(leptos::ev::focus, move |_| self.spawn_refresh());
            on_cleanup(move || handle.remove());
        }
    }
}

/// Log line for a check that did not reach the server's answer.
fn unsuccessful_check_message(check: &SessionCheck) -> Option<String> {
    match check {
        SessionCheck::Ok(_) => None,
        SessionCheck::Rejected(status) => Some(format!("session check rejected with status {status}")),
        SessionCheck::Failed(message) => Some(format!("session check failed: {message}")),
    }
}

// =============================================================
// Guard
// =============================================================

/// What a guarded route should do for the current auth state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// State not yet authoritative; show a neutral indicator.
    Loading,
    /// Show the guarded content.
    Render,
    /// Navigate to the target and render nothing.
    Redirect(String),
}

/// Decide the guard outcome. `require_auth == false` marks a guest-only
/// route such as the login page.
pub fn guard_decision(state: &AuthState, require_auth: bool, redirect_to: &str) -> GuardDecision {
    if state.is_loading {
        return GuardDecision::Loading;
    }
    match (require_auth, state.is_authenticated) {
        (true, false) => GuardDecision::Redirect(redirect_to.to_owned()),
        (false, true) => GuardDecision::Redirect(DEFAULT_LANDING.to_owned()),
        _ => GuardDecision::Render,
    }
}

/// Turns a stream of guard decisions into navigation commands, one per
/// transition into a redirect.
#[derive(Clone, Debug, Default)]
pub struct RedirectLatch {
    last: Option<GuardDecision>,
}

impl RedirectLatch {
    /// Record `decision` and return the target to navigate to, if this is a
    /// fresh transition into `Redirect`.
    pub fn observe(&mut self, decision: &GuardDecision) -> Option<String> {
        if self.last.as_ref() == Some(decision) {
            return None;
        }
        self.last = Some(decision.clone());
        match decision {
            GuardDecision::Redirect(target) => Some(target.clone()),
            GuardDecision::Loading | GuardDecision::Render => None,
        }
    }
}
