use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ensure_input, ensure_output, process, Converter};
use crate::error::ConvertError;
use crate::naming::pdf_output_path;

/// pandoc reading DOCX and rendering through a LaTeX engine.
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: String,
    pdf_engine: String,
}

impl Pandoc {
    pub const DEFAULT_PROGRAM: &'static str = "pandoc";
    pub const DEFAULT_PDF_ENGINE: &'static str = "xelatex";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pdf_engine: Self::DEFAULT_PDF_ENGINE.to_owned(),
        }
    }

    pub fn with_pdf_engine(mut self, engine: impl Into<String>) -> Self {
        self.pdf_engine = engine.into();
        self
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(input)
            .args(["--from", "docx", "--output"])
            .arg(output)
            .arg("--pdf-engine")
            .arg(&self.pdf_engine);
        cmd
    }
}

impl Default for Pandoc {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl Converter for Pandoc {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, ConvertError> {
        ensure_input(input).await?;
        let pdf = pdf_output_path(input, output_dir);
        process::run(self.command(input, &pdf), &self.program, timeout).await?;
        ensure_output(pdf).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn command_line_names_output_and_engine() {
        let pandoc = Pandoc::default().with_pdf_engine("lualatex");
        let cmd = pandoc.command(Path::new("/w/in.docx"), Path::new("/w/in.pdf"));
        let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
        assert_eq!(
            args,
            [
                "/w/in.docx",
                "--from",
                "docx",
                "--output",
                "/w/in.pdf",
                "--pdf-engine",
                "lualatex",
            ]
            .map(OsStr::new)
        );
    }

    #[tokio::test]
    async fn missing_input_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pandoc::default()
            .convert(&dir.path().join("ghost.docx"), dir.path(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InputNotFound(_)));
    }
}
