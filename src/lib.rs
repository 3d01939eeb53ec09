//! # studygen
//!
//! Turn lecture notes into study material (explanations, quizzes, practice
//! problems) using a hosted chat-completion model.
//!
//! ## Why this crate?
//!
//! Notes arrive in inconvenient shapes: pasted text, exported `.txt` files,
//! and PDFs that are often nothing but page scans with no selectable text.
//! This crate ingests all of them (falling back to page-by-page OCR for
//! scanned PDFs, with progress reporting), composes a mode-specific prompt,
//! and delegates the actual writing to an LLM behind a small provider trait.
//!
//! ## Pipeline Overview
//!
//! ```text
//! notes (.txt / .pdf / stdin)
//!  │
//!  ├─ 1. Ingest    read text, or extract PDF text, or rasterise + OCR
//!  ├─ 2. Prompt    fixed system instruction + mode template (explain/quiz/practice)
//!  ├─ 3. Complete  one chat-completion call (Groq, OpenAI-compatible wire)
//!  ├─ 4. Polish    markdown cleanup (outer fences, whitespace, zero-widths)
//!  └─ 5. Record    prepend to the bounded on-disk history (newest first)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use studygen::{generate, Mode, StudyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from GROQ_API_KEY
//!     let config = StudyConfig::default();
//!     let quiz = generate("Photosynthesis converts light into chemical energy...",
//!         Mode::Quiz, &config).await?;
//!     println!("{quiz}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `studygen` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! studygen = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod mode;
pub mod postprocess;
pub mod prompts;
pub mod server;

pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use completion::{CompletionProvider, GroqClient, EMPTY_COMPLETION_FALLBACK};
pub use config::{StudyConfig, StudyConfigBuilder};
pub use error::StudyError;
pub use history::{HistoryEntry, HistoryStore};
pub use ingest::Ingestor;
pub use mode::Mode;
pub use progress::{IngestProgress, NoopProgress, ProgressHandle};

use postprocess::clean_markdown;
use prompts::build_prompt;

/// One-shot generation: prompt the configured provider with `notes` in the
/// given mode and return the cleaned markdown.
///
/// This is the library-level convenience the CLI and server route both sit
/// on top of. It does not touch history; callers that want the run recorded
/// append to a [`HistoryStore`] themselves.
pub async fn generate(notes: &str, mode: Mode, config: &StudyConfig) -> Result<String, StudyError> {
    let client = GroqClient::from_config(config);
    generate_with(notes, mode, &client).await
}

/// Like [`generate`], but against any [`CompletionProvider`].
pub async fn generate_with(
    notes: &str,
    mode: Mode,
    provider: &dyn CompletionProvider,
) -> Result<String, StudyError> {
    let prompt = build_prompt(notes, mode);
    let raw = provider.complete(&prompt).await?;
    Ok(clean_markdown(&raw))
}
