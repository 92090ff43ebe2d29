//! Networking modules for the session-check HTTP call.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the request and `types` defines the wire schema.

pub mod api;
pub mod types;
