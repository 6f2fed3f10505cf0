//! External DOCX → PDF converters.
//!
//! A [`Converter`] is an opaque black box: given an input document and an
//! output directory it produces `<output_dir>/<input stem>.pdf` or fails.
//! Two implementations wrap real executables:
//!
//! - [`LibreOffice`] – `libreoffice --headless --convert-to pdf`
//! - [`Pandoc`] – `pandoc --from docx` with a LaTeX PDF engine

mod libreoffice;
mod pandoc;
pub(crate) mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::error::ConvertError;
use crate::job::JOB_FILE_PREFIX;

pub use libreoffice::LibreOffice;
pub use pandoc::Pandoc;

/// Default wait for a single conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A program that turns one DOCX file into one PDF file.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs and health output.
    fn name(&self) -> &str;

    /// Convert `input` and return the path of the produced PDF, which is
    /// always [`crate::naming::pdf_output_path`]`(input, output_dir)`.
    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, ConvertError>;
}

/// Which external program performs the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConverterKind {
    #[default]
    LibreOffice,
    Pandoc,
}

/// Knobs for [`ConverterKind::build`].
#[derive(Debug, Clone, Default)]
pub struct ConverterOptions {
    /// Executable name or path; `None` uses the converter's default.
    pub program: Option<String>,
    /// LaTeX engine passed to pandoc; ignored by LibreOffice.
    pub pdf_engine: Option<String>,
}

impl ConverterKind {
    /// Construct the converter this kind names.
    pub fn build(self, options: ConverterOptions) -> Arc<dyn Converter> {
        match self {
            ConverterKind::LibreOffice => {
                let program = options
                    .program
                    .unwrap_or_else(|| LibreOffice::DEFAULT_PROGRAM.to_owned());
                Arc::new(LibreOffice::new(program))
            }
            ConverterKind::Pandoc => {
                let mut pandoc = Pandoc::new(
                    options.program.unwrap_or_else(|| Pandoc::DEFAULT_PROGRAM.to_owned()),
                );
                if let Some(engine) = options.pdf_engine {
                    pandoc = pandoc.with_pdf_engine(engine);
                }
                Arc::new(pandoc)
            }
        }
    }
}

/// Convert a DOCX file that already lives on disk.
///
/// `output_dir` defaults to the input's own directory and is created when it
/// does not exist yet. Returns the path of the produced PDF.
pub async fn convert_docx_file(
    converter: &dyn Converter,
    input: &Path,
    output_dir: Option<&Path>,
    timeout: Duration,
) -> Result<PathBuf, ConvertError> {
    ensure_input(input).await?;

    let output_dir = match output_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            dir.to_path_buf()
        }
        None => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };

    let pdf = converter.convert(input, &output_dir, timeout).await?;
    info!(
        converter = converter.name(),
        input = %input.display(),
        output = %pdf.display(),
        "document converted"
    );
    Ok(pdf)
}

/// Convert a DOCX file on disk and return the PDF's contents.
///
/// The PDF is produced in a private temporary directory that is removed
/// before this returns, so nothing is left next to `input`.
pub async fn convert_docx_file_to_bytes(
    converter: &dyn Converter,
    input: &Path,
    timeout: Duration,
) -> Result<Bytes, ConvertError> {
    let scratch = tempfile::Builder::new().prefix(JOB_FILE_PREFIX).tempdir()?;
    let pdf = convert_docx_file(converter, input, Some(scratch.path()), timeout).await?;
    let data = tokio::fs::read(&pdf).await?;
    if data.is_empty() {
        return Err(ConvertError::EmptyOutput);
    }
    scratch.close()?;
    Ok(Bytes::from(data))
}

/// Checks shared by the executable-backed converters: the input must exist
/// before spawning, the PDF must exist afterwards.
pub(crate) async fn ensure_input(input: &Path) -> Result<(), ConvertError> {
    if tokio::fs::try_exists(input).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(ConvertError::InputNotFound(input.to_path_buf()))
    }
}

pub(crate) async fn ensure_output(pdf: PathBuf) -> Result<PathBuf, ConvertError> {
    if tokio::fs::try_exists(&pdf).await.unwrap_or(false) {
        Ok(pdf)
    } else {
        Err(ConvertError::OutputMissing(pdf))
    }
}
