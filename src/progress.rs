//! Progress-callback trait for ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgress>`] via
//! [`crate::ingest::Ingestor::with_progress`] to receive status messages and
//! a 0–100 percentage while a scanned PDF is OCR'd page by page.
//!
//! # Why callbacks instead of channels?
//!
//! The callback is the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a WebSocket, or a log line without the
//! library knowing how the host application communicates. The trait is
//! `Send + Sync` so a single handle can be shared with the blocking worker
//! threads the pipeline uses for pdfium and tesseract.
//!
//! Progress state is transient: it is reset at the start of every ingestion
//! and never persisted.

use std::sync::Arc;

/// Called by the ingestion pipeline as it works through a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait IngestProgress: Send + Sync {
    /// A human-readable status line, e.g. the OCR duration estimate.
    fn on_status(&self, message: &str) {
        let _ = message;
    }

    /// Percent complete, 0–100.
    ///
    /// During OCR the value reflects pages *started*, not pages finished:
    /// the pipeline reports before it processes each page and only reaches
    /// 100 via an explicit final call after the last page. Treat the number
    /// as an indication, not an exact count.
    fn on_percent(&self, percent: u8) {
        let _ = percent;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgress;

impl IngestProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::ingest::Ingestor`].
pub type ProgressHandle = Arc<dyn IngestProgress>;
