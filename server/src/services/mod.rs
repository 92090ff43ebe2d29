//! Collaborators used by relay and auth routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own outbound I/O (backend calls, session checks) behind
//! traits so route handlers can stay focused on request translation.

pub mod backend;
pub mod session;
