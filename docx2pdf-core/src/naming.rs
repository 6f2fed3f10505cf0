//! File-name rules shared by the HTTP surface, the CLI and the converters.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension accepted for uploads, compared case-insensitively.
pub const DOCX_EXTENSION: &str = "docx";

/// Name used when an upload's stem sanitises to nothing.
const FALLBACK_STEM: &str = "document";

/// Whether `file_name` ends in `.docx`, ignoring case.
pub fn is_docx(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.eq_ignore_ascii_case(DOCX_EXTENSION),
        None => false,
    }
}

/// Sanitize a filename to prevent directory traversal and header injection.
///
/// Only the final path component survives (both `/` and `\` count as
/// separators) and every character outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_filename(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Download name for the PDF produced from `original`, e.g.
/// `"Quarterly Report.DOCX"` becomes `"Quarterly_Report.pdf"`.
pub fn pdf_file_name(original: &str) -> String {
    let sanitized = sanitize_filename(original);
    let stem = match sanitized.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => sanitized.as_str(),
    };
    let stem = stem.trim_matches(['.', '_']);
    if stem.is_empty() {
        format!("{FALLBACK_STEM}.pdf")
    } else {
        format!("{stem}.pdf")
    }
}

/// Path a converter writes when asked to convert `input` into `output_dir`:
/// same base name, `.pdf` extension.
pub fn pdf_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(with_stem_suffix(input, ".pdf"))
}

/// Private LibreOffice user profile for converting `input` into
/// `output_dir`, e.g. `<output_dir>/docx2pdf_<id>_profile`.
pub fn profile_dir(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(with_stem_suffix(input, "_profile"))
}

fn with_stem_suffix(input: &Path, suffix: &str) -> OsString {
    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| FALLBACK_STEM.into());
    name.push(suffix);
    name
}
