//! The temp-file pair that backs a single conversion.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ConvertError;
use crate::naming::{pdf_output_path, profile_dir};

/// Prefix shared by every file a job creates in the work directory.
pub const JOB_FILE_PREFIX: &str = "docx2pdf_";

/// A uniquely named `<id>.docx` / `<id>.pdf` pair in the work directory,
/// plus the `<id>_profile` directory LibreOffice may create next to them.
///
/// Owning a `ConversionJob` owns all three: they are removed by
/// [`ConversionJob::finish`] on the happy path and by `Drop` on every other
/// path, including early returns and panics.
#[derive(Debug)]
pub struct ConversionJob {
    id: Uuid,
    dir: PathBuf,
    input_path: PathBuf,
    output_path: PathBuf,
    profile_dir: PathBuf,
    finished: bool,
}

impl ConversionJob {
    /// Reserve paths for a new job under `work_dir`. Nothing is written yet.
    pub fn new(work_dir: &Path) -> Self {
        let id = Uuid::new_v4();
        let input_path = work_dir.join(format!("{JOB_FILE_PREFIX}{id}.docx"));
        let output_path = pdf_output_path(&input_path, work_dir);
        let profile_dir = profile_dir(&input_path, work_dir);
        Self {
            id,
            dir: work_dir.to_path_buf(),
            input_path,
            output_path,
            profile_dir,
            finished: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Persist the uploaded document.
    pub async fn write_input(&self, bytes: &[u8]) -> Result<(), ConvertError> {
        tokio::fs::write(&self.input_path, bytes).await?;
        debug!(
            job_id = %self.id,
            path = %self.input_path.display(),
            size_bytes = bytes.len(),
            "job input written"
        );
        Ok(())
    }

    /// Read the converter's output; a zero-length file is a failed conversion.
    pub async fn read_output(&self) -> Result<Bytes, ConvertError> {
        let data = tokio::fs::read(&self.output_path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConvertError::OutputMissing(self.output_path.clone())
            } else {
                ConvertError::Io(e)
            }
        })?;
        if data.is_empty() {
            return Err(ConvertError::EmptyOutput);
        }
        Ok(Bytes::from(data))
    }

    /// Remove everything the job owns, reporting the first failure other
    /// than "not found".
    pub async fn finish(mut self) -> Result<(), ConvertError> {
        self.finished = true;
        let input = remove_if_exists(&self.input_path).await;
        let output = remove_if_exists(&self.output_path).await;
        let profile = remove_dir_if_exists(&self.profile_dir).await;
        debug!(job_id = %self.id, "job files removed");
        input?;
        output?;
        profile?;
        Ok(())
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        for path in [&self.input_path, &self.output_path] {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    debug!(job_id = %self.id, path = %path.display(), "removed leftover job file")
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    job_id = %self.id,
                    path = %path.display(),
                    error = %e,
                    "failed to remove job file"
                ),
            }
        }
        match std::fs::remove_dir_all(&self.profile_dir) {
            Ok(()) => debug!(job_id = %self.id, "removed leftover converter profile"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                job_id = %self.id,
                path = %self.profile_dir.display(),
                error = %e,
                "failed to remove converter profile"
            ),
        }
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            warn!(path = %path.display(), error = %e, "failed to remove job file");
            Err(e)
        }
        _ => Ok(()),
    }
}

async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            warn!(path = %path.display(), error = %e, "failed to remove converter profile");
            Err(e)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn paths_share_stem_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConversionJob::new(dir.path());
        assert_eq!(job.input_path().parent(), Some(dir.path()));
        assert_eq!(job.output_path().parent(), Some(dir.path()));
        assert_eq!(job.input_path().file_stem(), job.output_path().file_stem());
        assert_eq!(job.input_path().extension().unwrap(), "docx");
        assert_eq!(job.output_path().extension().unwrap(), "pdf");
        assert!(job.input_path().to_string_lossy().contains(&job.id().to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_jobs_never_share_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut handles = Vec::new();
        for _ in 0..64 {
            let work_dir = dir.path().to_path_buf();
            handles.push(tokio::spawn(async move {
                let job = ConversionJob::new(&work_dir);
                job.write_input(b"PK\x03\x04").await.unwrap();
                let path = job.input_path().to_path_buf();
                job.finish().await.unwrap();
                path
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()), "duplicate job path");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn finish_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConversionJob::new(dir.path());
        job.write_input(b"PK\x03\x04").await.unwrap();
        std::fs::write(job.output_path(), b"%PDF-1.7").unwrap();

        job.finish().await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn finish_removes_converter_profile() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConversionJob::new(dir.path());
        std::fs::create_dir_all(job.profile_dir().join("user")).unwrap();
        let settings = job.profile_dir().join("user").join("registrymodifications.xcu");
        std::fs::write(settings, b"<x/>").unwrap();

        job.finish().await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn drop_removes_files_without_finish() {
        let dir = tempfile::tempdir().unwrap();
        {
            let job = ConversionJob::new(dir.path());
            job.write_input(b"PK\x03\x04").await.unwrap();
            std::fs::write(job.output_path(), b"%PDF-1.7 partial").unwrap();
            std::fs::create_dir_all(job.profile_dir().join("user")).unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConversionJob::new(dir.path());
        std::fs::write(job.output_path(), b"").unwrap();
        assert!(matches!(job.read_output().await, Err(ConvertError::EmptyOutput)));
    }

    #[tokio::test]
    async fn missing_output_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConversionJob::new(dir.path());
        assert!(matches!(job.read_output().await, Err(ConvertError::OutputMissing(_))));
    }
}
