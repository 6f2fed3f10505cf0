//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use docx2pdf_core::ConversionService;

use crate::config::Config;

/// State shared across all HTTP handlers. Holds no per-request data.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Upload → convert → cleanup pipeline.
    pub service: Arc<ConversionService>,
}

impl AppState {
    /// Build the state for `config`, constructing the configured converter.
    pub fn from_config(config: Config) -> Self {
        let converter = config.converter.build(config.converter_options());
        let service =
            ConversionService::new(converter, config.work_dir.clone(), config.max_concurrent);
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }
}
