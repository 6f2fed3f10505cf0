use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;
use url::Url;

use super::{ensure_input, ensure_output, process, Converter};
use crate::error::ConvertError;
use crate::naming::{pdf_output_path, profile_dir};

/// LibreOffice in headless mode. Preserves formatting, images, tables and
/// embedded graphics better than the pandoc route.
///
/// Every conversion gets its own user profile next to the output
/// (`-env:UserInstallation`). Instances sharing a profile hand work to each
/// other or exit without writing a PDF, so concurrent runs must not share one.
#[derive(Debug, Clone)]
pub struct LibreOffice {
    program: String,
}

impl LibreOffice {
    pub const DEFAULT_PROGRAM: &'static str = "libreoffice";

    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn command(&self, input: &Path, output_dir: &Path, profile_url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(format!("-env:UserInstallation={profile_url}"))
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(output_dir)
            .arg(input);
        cmd
    }
}

impl Default for LibreOffice {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl Converter for LibreOffice {
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
        let profile = profile_dir(input, output_dir);
        let cmd = self.command(input, output_dir, &profile_url(&profile)?);

        let outcome = process::run(cmd, &self.program, timeout).await;
        match tokio::fs::remove_dir_all(&profile).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!(
                    path = %profile.display(),
                    error = %e,
                    "failed to remove LibreOffice profile"
                );
            }
            _ => {}
        }
        outcome?;

        ensure_output(pdf_output_path(input, output_dir)).await
    }
}

/// `file://` URL of `dir`, made absolute first since LibreOffice resolves
/// the profile location independently of our working directory.
fn profile_url(dir: &Path) -> Result<String, ConvertError> {
    let absolute = std::path::absolute(dir)?;
    Url::from_file_path(&absolute).map(String::from).map_err(|()| {
        ConvertError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot express {} as a file URL", absolute.display()),
        ))
    })
}
