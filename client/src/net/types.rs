//! Wire DTOs for the session-check endpoint.
//!
//! DESIGN
//! ======
//! Every field the server may omit is optional here so a partial or older
//! payload still decodes; interpretation of missing fields happens in
//! `state::auth`, not during deserialization.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Identity of the signed-in user as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

/// Role assumed when the server omits one.
fn default_role() -> String {
    "user".to_owned()
}

/// Body of `GET /api/auth/session`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub authenticated: Option<bool>,
    #[serde(default)]
    pub user: Option<UserSummary>,
}
