//! The completion pipeline entry points.
//!
//! [`StudyAssistant`] wires the stages together for one request:
//!
//! ```text
//! (text, mode) ─▶ validate ─▶ build_prompt ─▶ transport.complete ─▶ clean_response
//! ```
//!
//! Validation happens entirely before the transport is touched, so an empty
//! text or an unknown mode never costs an API call.

use crate::config::AssistantConfig;
use crate::error::StudyError;
use crate::mode::Mode;
use crate::pipeline::completion::{CompletionTransport, GroqClient};
use crate::pipeline::sanitize::clean_response;
use crate::prompts::build_prompt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A validated request: non-empty text and a known mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    text: String,
    mode: Mode,
}

impl CompletionRequest {
    /// Validate raw inputs. Text is checked before mode.
    pub fn new(text: impl Into<String>, mode: &str) -> Result<Self, StudyError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(StudyError::EmptyInput);
        }
        let mode = mode.parse()?;
        Ok(Self { text, mode })
    }

    pub fn with_mode(text: impl Into<String>, mode: Mode) -> Result<Self, StudyError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(StudyError::EmptyInput);
        }
        Ok(Self { text, mode })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionResult {
    pub mode: Mode,
    /// Completion exactly as the provider returned it.
    pub raw_text: String,
    /// `raw_text` after [`clean_response`]. The only part sent to browsers.
    pub cleaned_text: String,
    /// Wall-clock time spent waiting on the provider.
    pub duration_ms: u64,
}

/// Mode resolution, prompt building, one completion call, sanitisation.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct StudyAssistant {
    transport: Arc<dyn CompletionTransport>,
}

impl StudyAssistant {
    /// Use an existing transport (a fake in tests, a custom client elsewhere).
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self { transport }
    }

    /// Build the production pipeline backed by [`GroqClient`].
    pub fn from_config(config: &AssistantConfig) -> Result<Self, StudyError> {
        let client = GroqClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Run the pipeline on raw caller inputs.
    pub async fn generate(&self, text: &str, mode: &str) -> Result<CompletionResult, StudyError> {
        let request = CompletionRequest::new(text, mode)?;
        self.process(&request).await
    }

    /// Run the pipeline on an already validated request.
    pub async fn process(&self, request: &CompletionRequest) -> Result<CompletionResult, StudyError> {
        let prompt = build_prompt(request.mode, &request.text)?;
        info!(
            "Generating {} response via {} ({} chars of material)",
            request.mode,
            self.transport.name(),
            request.text.len()
        );

        let start = Instant::now();
        let raw_text = match self.transport.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Completion failed for mode {}: {}", request.mode, e);
                return Err(e);
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let cleaned_text = clean_response(&raw_text);
        debug!(
            "Sanitised completion: {} → {} chars",
            raw_text.len(),
            cleaned_text.len()
        );

        Ok(CompletionResult {
            mode: request.mode,
            raw_text,
            cleaned_text,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_checks_text_before_mode() {
        let err = CompletionRequest::new("   ", "essay").unwrap_err();
        assert!(matches!(err, StudyError::EmptyInput));

        let err = CompletionRequest::new("cells", "essay").unwrap_err();
        assert!(matches!(err, StudyError::InvalidMode { .. }));
    }

    #[test]
    fn request_keeps_text_verbatim() {
        let req = CompletionRequest::new("  mitochondria \n", "summary").unwrap();
        assert_eq!(req.text(), "  mitochondria \n");
        assert_eq!(req.mode(), Mode::Summary);
    }

    #[test]
    fn from_config_builds_groq_transport() {
        let config = AssistantConfig::builder().api_key("gsk_x").build().unwrap();
        let assistant = StudyAssistant::from_config(&config).unwrap();
        assert_eq!(assistant.transport.name(), "groq");
    }
}
