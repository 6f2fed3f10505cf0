use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while turning a DOCX file into a PDF.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input document does not exist on disk.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The converter executable could not be located.
    #[error("converter `{program}` is not installed or not on PATH")]
    ConverterNotFound { program: String },

    /// The converter executable exists but could not be started.
    #[error("failed to start converter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran and reported failure.
    #[error("{program} conversion failed ({}): {stderr}", exit_label(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The converter did not finish within the allotted time.
    #[error("{program} conversion timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// The converter exited cleanly but the expected PDF is missing.
    #[error("PDF file was not created: {}", .0.display())]
    OutputMissing(PathBuf),

    /// The converter produced a zero-length PDF.
    #[error("converter produced an empty PDF")]
    EmptyOutput,

    /// The service stopped accepting conversions.
    #[error("conversion service is shutting down")]
    Unavailable,

    /// Reading, writing or removing a temporary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// `true` when the converter itself is to blame, as opposed to the host's
    /// filesystem or the service lifecycle.
    pub fn is_conversion_failure(&self) -> bool {
        !matches!(self, ConvertError::Io(_) | ConvertError::Unavailable)
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}
