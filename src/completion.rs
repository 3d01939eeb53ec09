//! Completion client: one chat call per study request.
//!
//! [`CompletionProvider`] is the seam between the pipeline and the hosted
//! LLM. The production implementation, [`GroqClient`], speaks the OpenAI
//! chat-completions wire format against Groq's endpoint; tests substitute a
//! mock so the HTTP contract can be exercised without a network.
//!
//! Deliberate non-features, per the error-handling design: no retry, no
//! backoff, no request timeout. A failed call surfaces its best-effort
//! message and the caller decides whether to resubmit. A hung upstream
//! stalls the awaiting caller; there is nothing to cancel it with.

use crate::config::{StudyConfig, API_KEY_ENV};
use crate::error::StudyError;
use crate::prompts::Prompt;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Returned when the API answers 200 but the first choice carries no text.
pub const EMPTY_COMPLETION_FALLBACK: &str = "No response.";

/// A hosted chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send the composed prompt (system + user message) and return the
    /// generated text.
    async fn complete(&self, prompt: &Prompt) -> Result<String, StudyError>;
}

/// OpenAI-wire-format client for Groq (or any compatible endpoint).
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GroqClient {
    /// Build a client from config. The credential comes from
    /// `config.api_key`, falling back to the `GROQ_API_KEY` environment
    /// variable. A missing key does NOT fail here; it fails closed on the
    /// first [`complete`](CompletionProvider::complete) call, so a server
    /// can start without a key and report the configuration error per
    /// request.
    pub fn from_config(config: &StudyConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default();

        Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        }
    }

    /// True when a non-blank credential is configured.
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, StudyError> {
        // Fail closed: never send a request without a credential.
        if !self.has_credential() {
            return Err(StudyError::ProviderNotConfigured {
                hint: format!("Set {API_KEY_ENV} in the environment."),
            });
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user",   "content": prompt.user },
            ],
            "temperature": self.temperature,
        });

        debug!("completion request to {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StudyError::CompletionFailed {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StudyError::CompletionFailed {
                message: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(StudyError::CompletionFailed {
                message: extract_error_message(&text, status.as_u16()),
            });
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| StudyError::CompletionFailed {
                message: format!("unparseable completion response: {e}"),
            })?;

        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or(EMPTY_COMPLETION_FALLBACK)
            .to_string();

        debug!("completion returned {} chars", content.len());
        Ok(content)
    }
}

/// Best-effort extraction of a human-readable message from an error body.
///
/// Order of preference: the provider's `error.message` field, then the raw
/// body, then a generic status line. Mirrors what the UI ultimately shows,
/// so keep it short and front-loaded.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = v["error"]["message"].as_str() {
            return msg.to_string();
        }
        if let Some(msg) = v["error"].as_str() {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("provider returned HTTP {status}")
    } else {
        format!("HTTP {status}: {trimmed}")
    }
}
