//! DOCX → PDF upload routes.
//!
//! Both routes accept `multipart/form-data` with the document in a field
//! named `file` and funnel into the same [`ConversionService`] call:
//!
//! - `POST /api/convert` answers with the raw PDF, or a JSON `{"error": ...}`
//!   body. Guarded by `X-API-Key` when `API_KEY` is configured.
//! - `POST /convert` serves the browser form: the PDF comes back as a
//!   download, failures redirect back to the form with the message in the
//!   `error` query parameter.
//!
//! [`ConversionService`]: docx2pdf_core::ConversionService

use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use axum::Router;
use bytes::BytesMut;
use docx2pdf_core::{naming, ConvertedPdf, DocxUpload};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::auth;
use crate::schemas::convert::{ConvertUpload, ErrorBody};
use crate::state::AppState;

/// Multipart field that carries the document.
pub const UPLOAD_FIELD: &str = "file";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Response header carrying the conversion job's ID.
pub const X_CONVERSION_ID: HeaderName = HeaderName::from_static("x-conversion-id");

#[derive(OpenApi)]
#[openapi(
    paths(api_convert, web_convert),
    components(schemas(ConvertUpload, ErrorBody))
)]
pub struct ConvertApi;

/// Register the upload routes. The API route is wrapped in the API-key check.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let api = Router::new()
        .route("/api/convert", post(api_convert))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/convert", post(web_convert))
        .merge(api)
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
}

/// Convert an uploaded DOCX file and return the PDF bytes.
#[utoipa::path(
    post,
    path = "/api/convert",
    tag = "convert",
    request_body(
        content = ConvertUpload,
        content_type = "multipart/form-data",
        description = "DOCX upload in field `file`"
    ),
    params(
        (
            "X-API-Key" = Option<String>,
            Header,
            description = "Required when the server has API_KEY set"
        ),
    ),
    responses(
        (
            status = 200,
            description = "Converted PDF",
            content_type = "application/pdf",
            body = Vec<u8>
        ),
        (
            status = 400,
            description = "Missing or unselected file, or not a .docx",
            body = ErrorBody
        ),
        (status = 401, description = "Invalid or missing API key", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody),
    )
)]
pub async fn api_convert(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert_upload(&state, multipart, state.config.api_timeout).await
}

/// Browser form endpoint: download on success, redirect with `?error=` on failure.
#[utoipa::path(
    post,
    path = "/convert",
    tag = "convert",
    request_body(
        content = ConvertUpload,
        content_type = "multipart/form-data",
        description = "DOCX upload in field `file`"
    ),
    responses(
        (
            status = 200,
            description = "Converted PDF as an attachment",
            content_type = "application/pdf",
            body = Vec<u8>
        ),
        (
            status = 303,
            description = "Conversion failed; redirected to the form with an `error` query"
        ),
    )
)]
pub async fn web_convert(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match convert_upload(&state, multipart, state.config.web_timeout).await {
        Ok(response) => response,
        Err(e) => {
            let message = e.client_message();
            info!(
                status = e.status().as_u16(),
                error = %message,
                "web conversion failed; redirecting"
            );
            Redirect::to(&redirect_with_error(&state.config.web_redirect, &message)).into_response()
        }
    }
}

async fn convert_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    timeout: std::time::Duration,
) -> Result<Response, ServerError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let pdf = state.service.convert(upload, timeout).await?;
    pdf_response(pdf)
}

/// Pull the `file` part out of the form and validate it.
///
/// Other form fields are skipped. The size check runs while streaming so an
/// oversized upload is never held in memory beyond `max_bytes`.
pub(crate) async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<DocxUpload, ServerError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "request is not a multipart upload");
        ServerError::MissingFile
    })?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = field.name().unwrap_or(""), "ignoring form field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        if file_name.is_empty() {
            return Err(ServerError::NoFileSelected);
        }
        if !naming::is_docx(&file_name) {
            return Err(ServerError::InvalidExtension(file_name));
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(ServerError::FileTooLarge { limit: max_bytes });
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(ServerError::BadRequest("Uploaded file is empty".into()));
        }

        debug!(file_name = %file_name, size_bytes = data.len(), "received file upload");
        return Ok(DocxUpload::new(file_name, data.freeze()));
    }

    Err(ServerError::MissingFile)
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::FileTooLarge { limit: max_bytes }
    } else {
        ServerError::BadRequest(format!("Failed to read multipart body: {}", e.body_text()))
    }
}

fn pdf_response(pdf: ConvertedPdf) -> Result<Response, ServerError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", pdf.file_name))
        .map_err(|e| {
            ServerError::Internal(format!("invalid download name {:?}: {e}", pdf.file_name))
        })?;
    let job_id = HeaderValue::from_str(&pdf.job_id.to_string())
        .map_err(|e| ServerError::Internal(format!("invalid job id header: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PDF_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
            (X_CONVERSION_ID, job_id),
        ],
        Body::from(pdf.bytes),
    )
        .into_response())
}

fn redirect_with_error(target: &str, message: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", message)
        .finish();
    let separator = if target.contains('?') { '&' } else { '?' };
    format!("{target}{separator}{query}")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
