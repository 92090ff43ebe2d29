//! Auth-session state for the current browser tab.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware components to coordinate login
//! redirects and identity-dependent rendering. The state is only ever
//! replaced wholesale by a resolved session check; it is never merged.
//!
//! TRADE-OFFS
//! ==========
//! Overlapping refreshes (mount racing a focus event) are sequenced by
//! ticket: only the most recently started refresh may write, so a slow
//! stale answer cannot overwrite a newer one. A refresh that never resolves
//! leaves the previous state in place.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::{SessionResponse, UserSummary};

/// Outcome of one call to the session-check endpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionCheck {
    /// HTTP OK with a parsed body.
    Ok(SessionResponse),
    /// Non-OK HTTP status.
    Rejected(u16),
    /// Transport failure or malformed body.
    Failed(String),
}

/// Authentication state tracking the current user and loading status.
///
/// `is_loading` means the other two fields are not yet authoritative.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<UserSummary>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { is_authenticated: false, is_loading: true, user: None }
    }
}

impl AuthState {
    /// Resolved, logged-out state.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { is_authenticated: false, is_loading: false, user: None }
    }

    /// Derive state from a session check. Anything other than an OK answer
    /// that says `authenticated: true` resolves to anonymous.
    #[must_use]
    pub fn resolve(check: SessionCheck) -> Self {
        match check {
            SessionCheck::Ok(body) if body.authenticated.unwrap_or(false) => {
                Self { is_authenticated: true, is_loading: false, user: body.user }
            }
            SessionCheck::Ok(_) | SessionCheck::Rejected(_) | SessionCheck::Failed(_) => Self::anonymous(),
        }
    }
}

/// Identifies one refresh so its answer can be matched to the latest start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

/// Issues refresh tickets and decides which resolved answer may apply.
#[derive(Clone, Debug, Default)]
pub struct RefreshSequencer {
    issued: u64,
}

impl RefreshSequencer {
    /// Start a refresh; tickets increase monotonically.
    pub fn begin(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Whether an answer for `ticket` may replace the current state, i.e. no
    /// newer refresh has started since.
    #[must_use]
    pub fn accept(&self, ticket: RefreshTicket) -> bool {
        ticket.0 == self.issued
    }
}
