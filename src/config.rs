//! Configuration for note ingestion and study-artifact generation.
//!
//! All behaviour is controlled through [`StudyConfig`], built via its
//! [`StudyConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config between the CLI, the HTTP server, and tests, and to
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::StudyError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default chat-completion endpoint (OpenAI wire format, hosted by Groq).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Environment variable holding the completion credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration for ingestion and generation.
///
/// Built via [`StudyConfig::builder()`] or [`StudyConfig::default()`].
///
/// # Example
/// ```rust
/// use studygen::StudyConfig;
///
/// let config = StudyConfig::builder()
///     .model("llama-3.1-70b-versatile")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Chat-completion model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// API credential. `None` means "read [`API_KEY_ENV`] at client
    /// construction". An empty or absent key fails closed: the request is
    /// never attempted.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Low but non-zero: study material benefits from slight variation in
    /// examples while staying faithful to the notes.
    pub temperature: f32,

    /// Minimum embedded-text length (chars, after trimming) below which a
    /// PDF is treated as scanned and sent through OCR. Default: 50.
    pub min_embedded_chars: usize,

    /// Maximum rendered page dimension (width or height) in pixels when
    /// rasterising for OCR. Default: 2000.
    ///
    /// A safety cap independent of page size: an A0 poster rendered
    /// unbounded could exhaust memory, and tesseract gains nothing beyond
    /// roughly 2000 px on an A4 page.
    pub ocr_render_pixels: u32,

    /// Path to the tesseract binary. Default: the `STUDYGEN_TESSERACT`
    /// environment variable, falling back to `"tesseract"` on PATH.
    pub tesseract_path: String,

    /// Tesseract language code. Default: `"eng"`.
    pub ocr_language: String,

    /// Where the history JSON file lives. `None` means the per-user data
    /// directory (see [`default_history_path`]).
    pub history_path: Option<PathBuf>,

    /// Maximum retained history entries; oldest are evicted silently.
    /// Default: 20.
    pub history_capacity: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.3,
            min_embedded_chars: 50,
            ocr_render_pixels: 2000,
            tesseract_path: std::env::var("STUDYGEN_TESSERACT")
                .unwrap_or_else(|_| "tesseract".to_string()),
            ocr_language: "eng".to_string(),
            history_path: None,
            history_capacity: 20,
        }
    }
}

impl StudyConfig {
    /// Create a new builder for `StudyConfig`.
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder {
            config: Self::default(),
        }
    }

    /// The history file this config resolves to, if any location is known.
    pub fn resolved_history_path(&self) -> Option<PathBuf> {
        self.history_path.clone().or_else(default_history_path)
    }
}

/// The per-user default history file: `<data dir>/studygen/history.json`.
///
/// Returns `None` on platforms without a data directory; history is then
/// session-only, which matches the "silent non-persistence" contract.
pub fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("studygen").join("history.json"))
}

/// Builder for [`StudyConfig`].
#[derive(Debug)]
pub struct StudyConfigBuilder {
    config: StudyConfig,
}

impl StudyConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn min_embedded_chars(mut self, n: usize) -> Self {
        self.config.min_embedded_chars = n;
        self
    }

    pub fn ocr_render_pixels(mut self, px: u32) -> Self {
        self.config.ocr_render_pixels = px.max(100);
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<String>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.history_path = Some(path.into());
        self
    }

    pub fn history_capacity(mut self, n: usize) -> Self {
        self.config.history_capacity = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StudyConfig, StudyError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(StudyError::InvalidConfig("model must not be empty".into()));
        }
        if c.base_url.trim().is_empty() {
            return Err(StudyError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        if c.history_capacity == 0 {
            return Err(StudyError::InvalidConfig(
                "history_capacity must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
