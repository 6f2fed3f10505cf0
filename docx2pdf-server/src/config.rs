//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use docx2pdf_core::{ConverterKind, ConverterOptions, DEFAULT_TIMEOUT};

/// Room left on top of the file limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Runtime configuration for docx2pdf-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:5005"`, port taken from `PORT`).
    pub bind_address: String,

    /// Shared secret expected in `X-API-Key` on `/api/convert`.
    /// `None` disables the check.
    pub api_key: Option<String>,

    /// Largest accepted upload, in bytes (default: 16 MiB).
    pub max_upload_bytes: usize,

    /// Converter wait for `POST /api/convert`.
    pub api_timeout: Duration,

    /// Converter wait for the browser form at `POST /convert`.
    pub web_timeout: Duration,

    /// Which external converter to run.
    pub converter: ConverterKind,

    /// Converter executable override.
    pub converter_program: Option<String>,

    /// LaTeX engine used when `converter` is pandoc.
    pub pdf_engine: Option<String>,

    /// Directory that holds the per-request temp files.
    pub work_dir: PathBuf,

    /// Maximum converter processes running at once.
    pub max_concurrent: usize,

    /// Where the browser form is sent back to after a failed conversion.
    pub web_redirect: String,

    /// Comma-separated CORS allow-list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve the Swagger UI and OpenAPI document.
    pub enable_swagger: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let port: u16 = parse_or(lookup("PORT"), 5005);
        let max_upload_mb: usize = parse_or(lookup("DOCX2PDF_MAX_UPLOAD_MB"), 16);

        Self {
            bind_address: non_empty("DOCX2PDF_BIND").unwrap_or_else(|| format!("0.0.0.0:{port}")),
            api_key: non_empty("API_KEY"),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            api_timeout: Duration::from_secs(parse_or(
                lookup("DOCX2PDF_API_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT.as_secs(),
            )),
            web_timeout: Duration::from_secs(parse_or(lookup("DOCX2PDF_WEB_TIMEOUT_SECS"), 300)),
            converter: parse_or(lookup("DOCX2PDF_CONVERTER"), ConverterKind::LibreOffice),
            converter_program: non_empty("DOCX2PDF_CONVERTER_BIN"),
            pdf_engine: non_empty("DOCX2PDF_PDF_ENGINE"),
            work_dir: non_empty("DOCX2PDF_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_concurrent: parse_or(lookup("DOCX2PDF_MAX_CONCURRENT"), 2),
            web_redirect: env_or("DOCX2PDF_WEB_REDIRECT", "/"),
            cors_allowed_origins: non_empty("DOCX2PDF_CORS_ORIGINS"),
            enable_swagger: flag("DOCX2PDF_ENABLE_SWAGGER", true),
            log_level: env_or("DOCX2PDF_LOG", "info"),
            log_json: flag("DOCX2PDF_LOG_JSON", false),
        }
    }

    /// Options handed to [`ConverterKind::build`].
    pub fn converter_options(&self) -> ConverterOptions {
        ConverterOptions {
            program: self.converter_program.clone(),
            pdf_engine: self.pdf_engine.clone(),
        }
    }

    /// Request-body cap for the upload routes. Larger than
    /// [`Config::max_upload_bytes`] so a file of exactly the maximum size
    /// still fits together with its multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
