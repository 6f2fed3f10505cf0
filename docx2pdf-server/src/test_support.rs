//! Shared fixtures for router tests: a scripted converter and request builders.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use docx2pdf_core::naming::pdf_output_path;
use docx2pdf_core::{ConversionService, ConvertError, Converter};
use http_body_util::BodyExt;

use crate::config::Config;
use crate::schemas::convert::ErrorBody;
use crate::state::AppState;

pub const BOUNDARY: &str = "docx2pdf-test-boundary";

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy)]
pub enum FakeBehaviour {
    Succeed,
    TimeOut,
}

/// Stands in for LibreOffice: writes a tiny PDF or reports a timeout.
pub struct FakeConverter {
    behaviour: FakeBehaviour,
    calls: AtomicUsize,
}

impl FakeConverter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Converter for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pdf = pdf_output_path(input, output_dir);
        match self.behaviour {
            FakeBehaviour::Succeed => {
                tokio::fs::write(&pdf, b"%PDF-1.7\n% fake\n%%EOF").await?;
                Ok(pdf)
            }
            FakeBehaviour::TimeOut => {
                tokio::fs::write(&pdf, b"%PDF-1.7\n% partial").await?;
                Err(ConvertError::Timeout { program: "fake".into(), timeout })
            }
        }
    }
}

/// State backed by a [`FakeConverter`] and a private work directory.
/// `tweak` adjusts the default configuration before the state is built.
pub fn test_state(
    behaviour: FakeBehaviour,
    tweak: impl FnOnce(&mut Config),
) -> (Arc<AppState>, Arc<FakeConverter>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create work dir");
    let mut config = Config::default();
    config.work_dir = dir.path().to_path_buf();
    config.enable_swagger = false;
    tweak(&mut config);

    let fake = Arc::new(FakeConverter { behaviour, calls: AtomicUsize::new(0) });
    let service =
        ConversionService::new(fake.clone(), config.work_dir.clone(), config.max_concurrent);
    let state = AppState {
        config: Arc::new(config),
        service: Arc::new(service),
    };
    (Arc::new(state), fake, dir)
}

/// One part of a multipart form; `file_name: None` makes it a plain field.
pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content: &'a [u8],
}

/// `POST uri` with a single multipart file part.
pub fn multipart_request(uri: &str, field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    multipart_form(uri, &[FormPart { name: field, file_name: Some(file_name), content }])
}

/// `POST uri` with the given parts, in order.
pub fn multipart_form(uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {DOCX_CONTENT_TYPE}\r\n",
                part.name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(format!("--{BOUNDARY}\r\n{disposition}\r\n").as_bytes());
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("valid request")
}

/// Status and decoded `{"error": ...}` body of an error response.
pub async fn read_json(response: Response) -> (StatusCode, ErrorBody) {
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    let body = serde_json::from_slice(&bytes).expect("JSON error body");
    (status, body)
}
