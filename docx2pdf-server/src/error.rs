//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** temp-file I/O errors are logged with full detail but
//! only a generic message is returned to the caller so that file paths never
//! leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docx2pdf_core::ConvertError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// All errors that can occur in the docx2pdf-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request carried no usable `file` part.
    #[error("No file uploaded")]
    MissingFile,

    /// A `file` part was sent but no file was chosen (empty file name).
    #[error("No file selected")]
    NoFileSelected,

    /// The uploaded file name does not end in `.docx`.
    #[error("Invalid file type. Please upload a .docx file")]
    InvalidExtension(String),

    /// The upload is larger than the configured maximum.
    #[error("File too large: maximum upload size is {} bytes", .limit)]
    FileTooLarge { limit: usize },

    /// API-key checking is enabled and the caller's key is missing or wrong.
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// The caller sent an invalid or malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// The external converter failed, timed out or is absent.
    #[error("Error converting file: {0}")]
    ConversionFailed(ConvertError),

    /// The conversion service is no longer accepting work.
    #[error("conversion service unavailable")]
    Unavailable,

    /// Writing, reading or deleting a temp file failed.
    #[error("temp file I/O error: {0}")]
    InternalIo(#[source] std::io::Error),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConvertError> for ServerError {
    fn from(e: ConvertError) -> Self {
        if e.is_conversion_failure() {
            return ServerError::ConversionFailed(e);
        }
        match e {
            ConvertError::Io(io) => ServerError::InternalIo(io),
            _ => ServerError::Unavailable,
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingFile
            | ServerError::NoFileSelected
            | ServerError::InvalidExtension(_)
            | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::ConversionFailed(_)
            | ServerError::InternalIo(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client. Internal errors are logged here
    /// and replaced by a generic text.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::InternalIo(e) => {
                error!(error = %e, "temp file I/O error");
                "internal server error".to_owned()
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                "internal server error".to_owned()
            }
            ServerError::ConversionFailed(e) => {
                warn!(error = %e, "conversion failed");
                self.to_string()
            }
            ServerError::InvalidExtension(name) => {
                warn!(file_name = %name, "rejected upload with invalid extension");
                self.to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = self.client_message();
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
