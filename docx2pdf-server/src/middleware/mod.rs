//! HTTP middleware stack: API-key check, CORS and per-request trace IDs.

pub mod auth;
pub mod cors;
pub mod trace;
