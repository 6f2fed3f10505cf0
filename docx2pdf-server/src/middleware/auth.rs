use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ServerError;
use crate::state::AppState;

pub static X_API_KEY: &str = "x-api-key";

/// Reject the request with 401 unless it carries the configured API key.
/// A no-op when no key is configured.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = state.config.api_key.as_deref() {
        let provided = req.headers().get(X_API_KEY).map(|v| v.as_bytes());
        if !provided.is_some_and(|key| key_matches(key, expected.as_bytes())) {
            warn!(
                path = %req.uri().path(),
                key_present = provided.is_some(),
                "rejected request with invalid API key"
            );
            return ServerError::Unauthorized.into_response();
        }
    }
    next.run(req).await
}

/// Constant-time comparison of the provided key against the configured one.
fn key_matches(provided: &[u8], expected: &[u8]) -> bool {
    provided.ct_eq(expected).into()
}
