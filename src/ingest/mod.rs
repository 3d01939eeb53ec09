//! Note ingestion: turn an uploaded file into plain note text.
//!
//! ## Data Flow
//!
//! ```text
//! file ──▶ dispatch ──▶ extract ──▶ (fallback) rasterise ──▶ OCR
//! (.txt/.pdf) by ext     (pdfium)      per page, sequential  (tesseract)
//! ```
//!
//! A `.txt` file is the note text, verbatim. A `.pdf` first gets its
//! embedded text extracted page by page; only when that comes back shorter
//! than the configured threshold (a scanned document) does the pipeline fall
//! back to rendering each page and recognising it with OCR, reporting
//! status and percent between pages.
//!
//! OCR is strictly sequential, one page at a time in page order: the
//! progress callback fires between pages, and tesseract on a laptop
//! saturates a core anyway. There is no cancellation; callers that stop
//! caring simply drop the future's result.

pub mod ocr;
pub mod pdf;

use crate::config::StudyConfig;
use crate::error::StudyError;
use crate::progress::{NoopProgress, ProgressHandle};
use ocr::{OcrBackend, TesseractBackend};
use pdf::{PdfBackend, PdfiumBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates extraction, the OCR fallback, and progress reporting.
pub struct Ingestor {
    min_embedded_chars: usize,
    pdf: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrBackend>,
    progress: ProgressHandle,
}

impl Ingestor {
    /// Production ingestor: pdfium for PDF access, tesseract for OCR.
    pub fn new(config: &StudyConfig) -> Self {
        Self::with_backends(
            config,
            Arc::new(PdfiumBackend::new(config.ocr_render_pixels)),
            Arc::new(TesseractBackend::new(
                config.tesseract_path.clone(),
                config.ocr_language.clone(),
            )),
        )
    }

    /// Inject alternative backends (tests, embedded pdfium builds).
    pub fn with_backends(
        config: &StudyConfig,
        pdf: Arc<dyn PdfBackend>,
        ocr: Arc<dyn OcrBackend>,
    ) -> Self {
        Self {
            min_embedded_chars: config.min_embedded_chars,
            pdf,
            ocr,
            progress: Arc::new(NoopProgress),
        }
    }

    /// Attach a progress callback for OCR status/percent events.
    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = progress;
        self
    }

    /// Ingest one file, dispatching on its extension (case-insensitive).
    ///
    /// Returns the note text. Errors leave any previously-held notes with
    /// the caller untouched; nothing here is stateful.
    pub async fn ingest_file(&self, path: &Path) -> Result<String, StudyError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => self.read_text(path).await,
            "pdf" => self.ingest_pdf(path).await,
            _ => Err(StudyError::UnsupportedFile {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            }),
        }
    }

    /// `.txt`: the file's decoded contents, verbatim. No trimming, no
    /// normalisation, no length check.
    async fn read_text(&self, path: &Path) -> Result<String, StudyError> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            let path = path.to_path_buf();
            match e.kind() {
                std::io::ErrorKind::NotFound => StudyError::FileNotFound { path },
                std::io::ErrorKind::PermissionDenied => StudyError::PermissionDenied { path },
                _ => StudyError::FileRead { path, source: e },
            }
        })
    }

    async fn ingest_pdf(&self, path: &Path) -> Result<String, StudyError> {
        if !path.exists() {
            return Err(StudyError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        // ── Step 1: Embedded text ───────────────────────────────────────
        let page_texts = self.pdf.extract_pages(path).await?;
        let embedded = join_pages(&page_texts);
        debug!(
            "{}: {} pages, {} embedded chars",
            path.display(),
            page_texts.len(),
            embedded.chars().count()
        );

        if embedded.chars().count() >= self.min_embedded_chars {
            info!("{}: using embedded text", path.display());
            return Ok(embedded);
        }

        // ── Step 2: OCR fallback ────────────────────────────────────────
        let total = self.pdf.page_count(path).await?;
        info!("{}: treating as scanned, OCR over {total} pages", path.display());

        self.progress.on_status(&format!(
            "Scanned PDF detected — running OCR on {total} page{} (estimated {} min)",
            if total == 1 { "" } else { "s" },
            estimate_minutes(total)
        ));

        // Session workspace is released when `session` drops, on every
        // return path below.
        let mut session = self.ocr.start_session()?;
        let mut recognized: Vec<String> = Vec::with_capacity(total);

        for index in 0..total {
            // Percent reflects pages *started*, not finished: reported
            // before each page, then forced to 100 after the loop. Keep it
            // that way: downstream consumers display it as-is.
            let percent = ((index as f64 / total as f64) * 100.0).round() as u8;
            self.progress.on_percent(percent);

            let png = self.pdf.render_page_png(path, index).await?;
            let text = session.recognize(&png, index + 1).await?;
            recognized.push(text);
        }

        self.progress.on_percent(100);

        // OCR finding nothing is not an error: the caller gets empty notes.
        Ok(join_pages(&recognized))
    }
}

/// Concatenate per-page text with a blank-line separator and trim the ends.
/// Page boundaries are not preserved as data beyond that separator.
fn join_pages(pages: &[String]) -> String {
    pages.join("\n\n").trim().to_string()
}

/// OCR wall-clock estimate: `pages * 8 + 10` seconds, rounded up to whole
/// minutes, never less than one.
fn estimate_minutes(pages: usize) -> u64 {
    let secs = (pages as u64) * 8 + 10;
    secs.div_ceil(60).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::IngestProgress;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    // ── Fakes ────────────────────────────────────────────────────────────

    struct FakePdf {
        pages: Vec<String>,
        rendered: Mutex<Vec<usize>>,
    }

    impl FakePdf {
        fn new(pages: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages.iter().map(|s| s.to_string()).collect(),
                rendered: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PdfBackend for FakePdf {
        async fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, StudyError> {
            Ok(self.pages.clone())
        }

        async fn page_count(&self, _path: &Path) -> Result<usize, StudyError> {
            Ok(self.pages.len())
        }

        async fn render_page_png(
            &self,
            _path: &Path,
            index: usize,
        ) -> Result<Vec<u8>, StudyError> {
            self.rendered.lock().unwrap().push(index);
            Ok(vec![index as u8])
        }
    }

    struct FakeOcr {
        per_page: Vec<Result<String, String>>,
        calls: Arc<Mutex<Vec<usize>>>,
        session_released: Arc<AtomicBool>,
        session_started: Arc<AtomicBool>,
    }

    impl FakeOcr {
        fn new(per_page: &[&str]) -> Self {
            Self {
                per_page: per_page.iter().map(|s| Ok(s.to_string())).collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
                session_released: Arc::new(AtomicBool::new(false)),
                session_started: Arc::new(AtomicBool::new(false)),
            }
        }

        fn failing_on(mut self, page: usize, message: &str) -> Self {
            self.per_page[page - 1] = Err(message.to_string());
            self
        }
    }

    impl OcrBackend for FakeOcr {
        fn start_session(&self) -> Result<Box<dyn ocr::OcrSession>, StudyError> {
            self.session_started.store(true, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                per_page: self.per_page.clone(),
                calls: Arc::clone(&self.calls),
                released: Arc::clone(&self.session_released),
            }))
        }
    }

    struct FakeSession {
        per_page: Vec<Result<String, String>>,
        calls: Arc<Mutex<Vec<usize>>>,
        released: Arc<AtomicBool>,
    }

    impl Drop for FakeSession {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ocr::OcrSession for FakeSession {
        async fn recognize(&mut self, _png: &[u8], page: usize) -> Result<String, StudyError> {
            self.calls.lock().unwrap().push(page);
            match &self.per_page[page - 1] {
                Ok(text) => Ok(text.clone()),
                Err(detail) => Err(StudyError::OcrFailed {
                    page,
                    detail: detail.clone(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Recording {
        statuses: Mutex<Vec<String>>,
        percents: Mutex<Vec<u8>>,
    }

    impl IngestProgress for Recording {
        fn on_status(&self, message: &str) {
            self.statuses.lock().unwrap().push(message.to_string());
        }

        fn on_percent(&self, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }
    }

    fn ingestor(pdf: Arc<FakePdf>, ocr: FakeOcr) -> Ingestor {
        let config = StudyConfig::default();
        Ingestor::with_backends(&config, pdf, Arc::new(ocr))
    }

    // ── .txt handling ────────────────────────────────────────────────────

    #[tokio::test]
    async fn txt_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let contents = "  raw notes\nwith trailing space  \n";
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();

        let ing = ingestor(FakePdf::new(&[]), FakeOcr::new(&[]));
        let notes = ing.ingest_file(&path).await.unwrap();
        assert_eq!(notes, contents, "txt must not be transformed");
    }

    #[tokio::test]
    async fn extension_dispatch_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NOTES.TXT");
        std::fs::write(&path, "shouting notes").unwrap();

        let ing = ingestor(FakePdf::new(&[]), FakeOcr::new(&[]));
        assert_eq!(ing.ingest_file(&path).await.unwrap(), "shouting notes");
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let ing = ingestor(FakePdf::new(&[]), FakeOcr::new(&[]));
        let err = ing
            .ingest_file(Path::new("slides.pptx"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::UnsupportedFile { name } if name == "slides.pptx"));
    }

    #[tokio::test]
    async fn missing_txt_is_file_not_found() {
        let ing = ingestor(FakePdf::new(&[]), FakeOcr::new(&[]));
        let err = ing
            .ingest_file(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::FileNotFound { .. }));
    }

    // ── PDF embedded-text path ───────────────────────────────────────────

    fn touch_pdf(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
        path
    }

    #[tokio::test]
    async fn long_embedded_text_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_pdf(&dir);

        let long_page = "The derivative of a function measures its instantaneous rate of change.";
        let pdf = FakePdf::new(&[long_page, "Second page content here."]);
        let ocr = FakeOcr::new(&[]);
        let started = Arc::clone(&ocr.session_started);

        let notes = ingestor(Arc::clone(&pdf), ocr)
            .ingest_file(&path)
            .await
            .unwrap();

        assert_eq!(
            notes,
            format!("{long_page}\n\nSecond page content here.")
        );
        assert!(!started.load(Ordering::SeqCst), "OCR must never start");
        assert!(pdf.rendered.lock().unwrap().is_empty(), "no pages rendered");
    }

    #[tokio::test]
    async fn embedded_text_is_trimmed_and_blank_line_joined() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_pdf(&dir);

        // > 50 chars total, with whitespace the join must trim at the ends.
        let pdf = FakePdf::new(&[
            "  Acids donate protons in aqueous solution.  ",
            "Bases accept protons; pH measures acidity. ",
        ]);
        let notes = ingestor(pdf, FakeOcr::new(&[]))
            .ingest_file(&path)
            .await
            .unwrap();

        assert!(notes.starts_with("Acids"));
        assert!(notes.ends_with("acidity."));
        assert!(notes.contains("\n\n"));
    }

    // ── OCR fallback ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn scanned_pdf_runs_ocr_once_per_page_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_pdf(&dir);

        let pdf = FakePdf::new(&["", " ", ""]); // 3 pages, no embedded text
        let ocr = FakeOcr::new(&["alpha", "beta", "gamma"]);
        let calls = Arc::clone(&ocr.calls);
        let progress = Arc::new(Recording::default());

        let notes = ingestor(Arc::clone(&pdf), ocr)
            .with_progress(progress.clone())
            .ingest_file(&path)
            .await
            .unwrap();

        assert_eq!(notes, "alpha\n\nbeta\n\ngamma");
        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(*pdf.rendered.lock().unwrap(), vec![0, 1, 2]);

        // Percent is published before each page (pages started, not
        // finished), then forced to 100 after the loop.
        assert_eq!(*progress.percents.lock().unwrap(), vec![0, 33, 67, 100]);

        let statuses = progress.statuses.lock().unwrap();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].contains("3 pages"), "got: {}", statuses[0]);
        assert!(statuses[0].contains("1 min"), "got: {}", statuses[0]);
    }

    #[tokio::test]
    async fn ocr_failure_aborts_and_releases_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_pdf(&dir);

        let pdf = FakePdf::new(&["", "", ""]);
        let ocr = FakeOcr::new(&["one", "two", "three"]).failing_on(2, "engine crashed");
        let released = Arc::clone(&ocr.session_released);
        let calls = Arc::clone(&ocr.calls);

        let err = ingestor(pdf, ocr).ingest_file(&path).await.unwrap_err();
        assert!(matches!(err, StudyError::OcrFailed { page: 2, .. }));
        assert_eq!(*calls.lock().unwrap(), vec![1, 2], "no pages after the failure");
        assert!(released.load(Ordering::SeqCst), "session must be released on error");
    }

    #[tokio::test]
    async fn ocr_yielding_nothing_completes_with_empty_notes() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_pdf(&dir);

        let pdf = FakePdf::new(&["", ""]);
        let ocr = FakeOcr::new(&["", " "]);
        let released = Arc::clone(&ocr.session_released);

        let notes = ingestor(pdf, ocr).ingest_file(&path).await.unwrap();
        assert_eq!(notes, "", "empty notes, no error");
        assert!(released.load(Ordering::SeqCst));
    }

    // ── Estimate ─────────────────────────────────────────────────────────

    #[test]
    fn estimate_rounds_up_with_a_floor_of_one_minute() {
        assert_eq!(estimate_minutes(1), 1); // 18 s
        assert_eq!(estimate_minutes(3), 1); // 34 s
        assert_eq!(estimate_minutes(7), 2); // 66 s
        assert_eq!(estimate_minutes(10), 2); // 90 s
        assert_eq!(estimate_minutes(50), 7); // 410 s
        assert_eq!(estimate_minutes(0), 1);
    }
}
