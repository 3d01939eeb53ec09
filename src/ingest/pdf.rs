//! PDF access: embedded-text extraction and page rasterisation via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so the Tokio worker threads never stall during CPU-heavy
//! parsing or rendering.
//!
//! ## Why a trait?
//!
//! [`PdfBackend`] is the seam between the orchestrator and the native
//! library: the ingestion logic (heuristics, ordering, progress) is tested
//! against an in-memory fake, while this module stays a thin adapter over
//! pdfium with no decisions of its own.

use crate::error::StudyError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only access to one PDF document on disk.
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Embedded selectable text for every page, in page order. A scanned
    /// page yields an empty (or near-empty) string rather than an error.
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, StudyError>;

    /// Number of pages in the document.
    async fn page_count(&self, path: &Path) -> Result<usize, StudyError>;

    /// Rasterise one page (0-indexed) to PNG bytes for OCR input.
    async fn render_page_png(&self, path: &Path, index: usize) -> Result<Vec<u8>, StudyError>;
}

/// Production backend over pdfium.
pub struct PdfiumBackend {
    /// Maximum rendered dimension (either axis) in pixels.
    render_pixels: u32,
}

impl PdfiumBackend {
    pub fn new(render_pixels: u32) -> Self {
        Self { render_pixels }
    }
}

#[async_trait]
impl PdfBackend for PdfiumBackend {
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, StudyError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_pages_blocking(&path))
            .await
            .map_err(|e| StudyError::Internal(format!("extract task panicked: {e}")))?
    }

    async fn page_count(&self, path: &Path) -> Result<usize, StudyError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let pdfium = Pdfium::default();
            let document = open_document(&pdfium, &path)?;
            Ok(document.pages().len() as usize)
        })
        .await
        .map_err(|e| StudyError::Internal(format!("page-count task panicked: {e}")))?
    }

    async fn render_page_png(&self, path: &Path, index: usize) -> Result<Vec<u8>, StudyError> {
        let path = path.to_path_buf();
        let pixels = self.render_pixels;
        tokio::task::spawn_blocking(move || render_page_blocking(&path, index, pixels))
            .await
            .map_err(|e| StudyError::Internal(format!("render task panicked: {e}")))?
    }
}

/// Open a document, mapping pdfium's error soup onto [`StudyError::PdfParse`].
fn open_document<'a>(
    pdfium: &'a Pdfium,
    path: &PathBuf,
) -> Result<PdfDocument<'a>, StudyError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| StudyError::PdfParse {
            path: path.clone(),
            detail: format!("{e:?}"),
        })
}

fn extract_pages_blocking(path: &PathBuf) -> Result<Vec<String>, StudyError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path)?;
    let pages = document.pages();
    let total = pages.len() as usize;

    let mut texts = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map(|t| t.all())
            .unwrap_or_default();
        debug!("page {}: {} embedded chars", idx + 1, text.len());
        texts.push(text);
    }

    Ok(texts)
}

fn render_page_blocking(path: &PathBuf, index: usize, pixels: u32) -> Result<Vec<u8>, StudyError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path)?;
    let pages = document.pages();

    let page = pages
        .get(index as u16)
        .map_err(|e| StudyError::RasterisationFailed {
            page: index + 1,
            detail: format!("{e:?}"),
        })?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(pixels as i32)
        .set_maximum_height(pixels as i32);

    let bitmap =
        page.render_with_config(&render_config)
            .map_err(|e| StudyError::RasterisationFailed {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

    let image = bitmap.as_image();
    debug!(
        "rendered page {} → {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );

    encode_png(&image, index)
}

/// PNG-encode a rendered page. PNG over JPEG: lossless compression keeps
/// text crisp, and OCR accuracy degrades fast on compression artefacts.
fn encode_png(img: &DynamicImage, index: usize) -> Result<Vec<u8>, StudyError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| StudyError::RasterisationFailed {
            page: index + 1,
            detail: format!("PNG encoding failed: {e}"),
        })?;
    Ok(buf)
}
