//! Error types for the studygen library.
//!
//! One enum covers the whole pipeline. Every failure here is terminal for the
//! operation that raised it but never for the process: ingestion errors leave
//! previously-loaded notes untouched, completion errors leave history
//! untouched, and the caller (CLI or HTTP handler) is free to retry.
//!
//! History persistence failures are deliberately *not* represented here;
//! they are swallowed inside [`crate::history::HistoryStore`] (logged at
//! warn) so a full disk or read-only home directory can never take down a
//! study session.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the studygen library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded file has an extension the ingestor does not handle.
    #[error("Unsupported file type '{name}': please upload a .txt or .pdf file.")]
    UnsupportedFile { name: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {:?}", .path.display(), .path)]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read (bad encoding, I/O fault).
    #[error("Failed to read '{}': {}", .path.display(), .source)]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The PDF could not be opened or parsed at all.
    #[error("Could not parse PDF '{}': {}\nTry repairing with: qpdf --decrypt input.pdf output.pdf", .path.display(), .detail)]
    PdfParse { path: PathBuf, detail: String },

    /// Rendering a single page to an image failed.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine could not be started at all.
    #[error("OCR engine unavailable: {detail}\nInstall tesseract (e.g. `apt install tesseract-ocr`) or point STUDYGEN_TESSERACT at the binary.")]
    OcrUnavailable { detail: String },

    /// Recognition failed for a specific page.
    #[error("OCR failed on page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    // ── Completion errors ─────────────────────────────────────────────────
    /// No API credential is configured; the request was never sent.
    #[error("Completion provider is not configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    /// The upstream completion call failed (best-effort extracted message).
    #[error("Completion call failed: {message}")]
    CompletionFailed { message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    /// True for errors the HTTP boundary reports as a server fault (500)
    /// rather than a client mistake (400).
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            StudyError::ProviderNotConfigured { .. }
                | StudyError::CompletionFailed { .. }
                | StudyError::Internal(_)
        )
    }
}
