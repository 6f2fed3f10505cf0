//! Upload → convert → cleanup pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::converter::Converter;
use crate::error::ConvertError;
use crate::job::ConversionJob;
use crate::naming::pdf_file_name;

/// A validated DOCX upload.
#[derive(Debug, Clone)]
pub struct DocxUpload {
    /// Name the client gave the file; only used to name the result.
    pub file_name: String,
    pub bytes: Bytes,
}

impl DocxUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { file_name: file_name.into(), bytes: bytes.into() }
    }
}

/// The PDF produced for a [`DocxUpload`].
#[derive(Debug, Clone)]
pub struct ConvertedPdf {
    pub job_id: Uuid,
    /// Download name derived from the upload's name.
    pub file_name: String,
    pub bytes: Bytes,
}

/// Runs one [`ConversionJob`] per call against a shared [`Converter`].
pub struct ConversionService {
    converter: Arc<dyn Converter>,
    work_dir: PathBuf,
    permits: Semaphore,
}

impl std::fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionService")
            .field("converter", &self.converter.name())
            .field("work_dir", &self.work_dir)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl ConversionService {
    /// `max_concurrent` bounds how many converter processes run at once;
    /// zero is treated as one.
    pub fn new(
        converter: Arc<dyn Converter>,
        work_dir: impl Into<PathBuf>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            converter,
            work_dir: work_dir.into(),
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    pub fn converter_name(&self) -> &str {
        self.converter.name()
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Stop admitting new conversions; waiting callers get
    /// [`ConvertError::Unavailable`].
    pub fn close(&self) {
        self.permits.close();
    }

    /// Convert `upload`, waiting at most `timeout` for the converter.
    ///
    /// Both temp files are gone when this returns, whatever the outcome.
    pub async fn convert(
        &self,
        upload: DocxUpload,
        timeout: Duration,
    ) -> Result<ConvertedPdf, ConvertError> {
        let _permit = self.permits.acquire().await.map_err(|_| ConvertError::Unavailable)?;

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let job = ConversionJob::new(&self.work_dir);
        let started = Instant::now();
        debug!(
            job_id = %job.id(),
            file_name = %upload.file_name,
            size_bytes = upload.bytes.len(),
            converter = self.converter.name(),
            "conversion job created"
        );

        job.write_input(&upload.bytes).await?;

        let produced = self.converter.convert(job.input_path(), job.dir(), timeout).await;
        let produced = match produced {
            Ok(path) => path,
            Err(e) => {
                warn!(job_id = %job.id(), error = %e, "conversion failed");
                return Err(e);
            }
        };
        if produced != job.output_path() {
            warn!(
                job_id = %job.id(),
                expected = %job.output_path().display(),
                produced = %produced.display(),
                "converter reported an unexpected output path"
            );
        }

        let bytes = job.read_output().await?;
        let job_id = job.id();
        job.finish().await?;

        info!(
            job_id = %job_id,
            file_name = %upload.file_name,
            pdf_bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "conversion succeeded"
        );

        Ok(ConvertedPdf {
            job_id,
            file_name: pdf_file_name(&upload.file_name),
            bytes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::naming::pdf_output_path;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    const TIMEOUT: Duration = Duration::from_secs(5);

    enum Behaviour {
        Succeed,
        Fail,
        EmptyPdf,
        Panic,
        Slow,
    }

    struct FakeConverter {
        behaviour: Behaviour,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeConverter {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
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
            _timeout: Duration,
        ) -> Result<PathBuf, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(input.exists(), "input must be written before conversion");
            let pdf = pdf_output_path(input, output_dir);
            match self.behaviour {
                Behaviour::Succeed => {
                    tokio::fs::write(&pdf, b"%PDF-1.7 fake").await?;
                    Ok(pdf)
                }
                Behaviour::Fail => {
                    // Leave a partial file behind, as a crashing converter would.
                    tokio::fs::write(&pdf, b"%PDF-1.7 trunc").await?;
                    Err(ConvertError::Failed {
                        program: "fake".into(),
                        code: Some(1),
                        stderr: "boom".into(),
                    })
                }
                Behaviour::EmptyPdf => {
                    tokio::fs::write(&pdf, b"").await?;
                    Ok(pdf)
                }
                Behaviour::Panic => panic!("converter crashed"),
                Behaviour::Slow => {
                    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    self.peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    tokio::fs::write(&pdf, b"%PDF-1.7 slow").await?;
                    Ok(pdf)
                }
            }
        }
    }

    fn upload() -> DocxUpload {
        DocxUpload::new("Annual Report.docx", Bytes::from_static(b"PK\x03\x04 docx"))
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    #[traced_test]
    async fn success_returns_pdf_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeConverter::new(Behaviour::Succeed);
        let service = ConversionService::new(fake.clone(), dir.path(), 2);

        let pdf = service.convert(upload(), TIMEOUT).await.unwrap();
        assert_eq!(pdf.file_name, "Annual_Report.pdf");
        assert_eq!(&pdf.bytes[..], b"%PDF-1.7 fake");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(entries(dir.path()), 0);
        assert!(logs_contain("conversion succeeded"));
    }

    #[tokio::test]
    async fn failure_is_returned_and_partial_output_removed() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConversionService::new(FakeConverter::new(Behaviour::Fail), dir.path(), 2);

        let err = service.convert(upload(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, ConvertError::Failed { .. }));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn empty_pdf_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeConverter::new(Behaviour::EmptyPdf);
        let service = ConversionService::new(fake, dir.path(), 2);

        let err = service.convert(upload(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, ConvertError::EmptyOutput));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn panicking_converter_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeConverter::new(Behaviour::Panic);
        let service = Arc::new(ConversionService::new(fake, dir.path(), 2));

        let task = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.convert(upload(), TIMEOUT).await }
        });
        let join_err = task.await.unwrap_err();
        assert!(join_err.is_panic());
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_work_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("spool");
        let service = ConversionService::new(FakeConverter::new(Behaviour::Succeed), &work_dir, 1);
        assert_eq!(service.work_dir(), work_dir);

        service.convert(upload(), TIMEOUT).await.unwrap();
        assert!(work_dir.is_dir());
        assert_eq!(entries(&work_dir), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded_by_permits() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeConverter::new(Behaviour::Slow);
        let service = Arc::new(ConversionService::new(fake.clone(), dir.path(), 1));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move { service.convert(upload(), TIMEOUT).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), 4);
        assert_eq!(fake.peak.load(Ordering::SeqCst), 1);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn closed_service_rejects_work() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeConverter::new(Behaviour::Succeed);
        let service = ConversionService::new(fake.clone(), dir.path(), 1);
        service.close();

        let err = service.convert(upload(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, ConvertError::Unavailable));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }
}
