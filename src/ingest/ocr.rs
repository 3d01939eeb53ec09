//! OCR engine adapter: tesseract behind a per-ingestion session.
//!
//! Recognition itself is an external capability: this module shells out to
//! the `tesseract` CLI rather than reimplementing any of it. Each ingestion
//! opens one [`OcrSession`] holding a temp workspace for the rendered page
//! images; dropping the session deletes the workspace, so the engine's only
//! real resource is released on every return path, success or error.
//!
//! The CLI runs under `spawn_blocking`: `Command::output()` blocks, and OCR
//! on a full page takes seconds.

use crate::error::StudyError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

/// Factory for OCR sessions. One session per ingestion.
pub trait OcrBackend: Send + Sync {
    /// Start a recognition session, verifying the engine is usable.
    fn start_session(&self) -> Result<Box<dyn OcrSession>, StudyError>;
}

/// One ingestion's worth of OCR work. Dropped (and its workspace released)
/// when the ingestion returns, whether or not recognition succeeded.
#[async_trait]
pub trait OcrSession: Send {
    /// Recognise one rendered page. `page` is 1-indexed, used for error
    /// reporting and workspace file naming.
    async fn recognize(&mut self, png: &[u8], page: usize) -> Result<String, StudyError>;
}

/// Tesseract-CLI backend.
pub struct TesseractBackend {
    binary: String,
    language: String,
}

impl TesseractBackend {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Check the binary responds to `--version`.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl OcrBackend for TesseractBackend {
    fn start_session(&self) -> Result<Box<dyn OcrSession>, StudyError> {
        if !self.is_available() {
            return Err(StudyError::OcrUnavailable {
                detail: format!("'{}' not found or not runnable", self.binary),
            });
        }

        let workspace = TempDir::new().map_err(|e| StudyError::OcrUnavailable {
            detail: format!("could not create OCR workspace: {e}"),
        })?;

        debug!("OCR session workspace: {}", workspace.path().display());

        Ok(Box::new(TesseractSession {
            binary: self.binary.clone(),
            language: self.language.clone(),
            workspace,
        }))
    }
}

struct TesseractSession {
    binary: String,
    language: String,
    /// Holds the rendered page images; removed when the session drops.
    workspace: TempDir,
}

impl TesseractSession {
    fn page_path(&self, page: usize) -> PathBuf {
        self.workspace.path().join(format!("page_{page}.png"))
    }
}

#[async_trait]
impl OcrSession for TesseractSession {
    async fn recognize(&mut self, png: &[u8], page: usize) -> Result<String, StudyError> {
        let image_path = self.page_path(page);
        tokio::fs::write(&image_path, png)
            .await
            .map_err(|e| StudyError::OcrFailed {
                page,
                detail: format!("could not write page image: {e}"),
            })?;

        let binary = self.binary.clone();
        let language = self.language.clone();

        // tesseract <image> stdout -l <lang>
        let output = tokio::task::spawn_blocking(move || {
            Command::new(&binary)
                .arg(&image_path)
                .arg("stdout")
                .arg("-l")
                .arg(&language)
                .output()
        })
        .await
        .map_err(|e| StudyError::Internal(format!("OCR task panicked: {e}")))?
        .map_err(|e| StudyError::OcrFailed {
            page,
            detail: format!("failed to run tesseract: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StudyError::OcrFailed {
                page,
                detail: format!(
                    "tesseract exited with code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("page {page}: OCR produced {} chars", text.len());
        Ok(text)
    }
}
