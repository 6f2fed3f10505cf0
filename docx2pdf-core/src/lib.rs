//! DOCX → PDF conversion by way of an external converter process.
//!
//! # Quick-start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use docx2pdf_core::{ConversionService, ConverterKind, ConverterOptions, DocxUpload};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let converter = ConverterKind::LibreOffice.build(ConverterOptions::default());
//! let service = ConversionService::new(converter, std::env::temp_dir(), 2);
//!
//! let docx = std::fs::read("report.docx").unwrap();
//! let pdf = service
//!     .convert(DocxUpload::new("report.docx", docx), Duration::from_secs(120))
//!     .await
//!     .unwrap();
//! std::fs::write(&pdf.file_name, &pdf.bytes).unwrap();
//! # }
//! ```

pub mod converter;
mod error;
pub mod job;
pub mod naming;
mod service;

pub use converter::{
    convert_docx_file, convert_docx_file_to_bytes, Converter, ConverterKind, ConverterOptions,
    LibreOffice, Pandoc, DEFAULT_TIMEOUT,
};
pub use error::ConvertError;
pub use job::ConversionJob;
pub use service::{ConversionService, ConvertedPdf, DocxUpload};
