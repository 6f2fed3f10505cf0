//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI document endpoint (disable with `DOCX2PDF_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - `POST /convert` (browser form) and `POST /api/convert` (API, optionally key-protected)

pub mod convert;
pub mod doc;
mod health;

use axum::{
    middleware::{self},
    Router,
};
use crate::middleware::{cors, trace};
use crate::state::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(health::router())
        .merge(convert::router(state.clone()));

    let mut app = Router::new().merge(api_router);

    // Enabled by default; disable with DOCX2PDF_ENABLE_SWAGGER=false in production.
    if state.config.enable_swagger {
        app = app.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()),
        );
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
