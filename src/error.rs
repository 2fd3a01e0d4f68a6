//! Error types for the study-assistant library.
//!
//! Every failure the pipeline can produce is a variant of [`StudyError`].
//! All of them are terminal for the current request: nothing is retried
//! internally, callers that need resilience wrap the pipeline themselves.
//!
//! The variants fall into three groups:
//!
//! * **Input**: caught before any network call (`EmptyInput`,
//!   `InvalidMode`, and the upload checks of the HTTP shell).
//! * **Credential**: `Unauthorized`, detected at startup and again before
//!   each call.
//! * **Provider**: outcome of the single chat-completion round trip
//!   (`ProviderError`, `RateLimited`, `EmptyCompletion`, `TransportFailure`).
//!
//! Display strings are written for the person using the front end. None of
//! them ever contain the API key.

use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure originated from.
///
/// Carried by [`StudyError::Internal`] so that unclassified failures still
/// say where they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Extraction,
    Completion,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Upload => "upload",
            Stage::Extraction => "text extraction",
            Stage::Completion => "completion",
        };
        f.write_str(name)
    }
}

/// All errors returned by the study-assistant library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Text was empty or whitespace-only.
    #[error("No text content provided")]
    EmptyInput,

    /// Mode is not one of quiz, summary, podcast, tutor.
    #[error("Invalid mode '{mode}'. Expected one of: quiz, summary, podcast, tutor")]
    InvalidMode { mode: String },

    /// Neither a file nor a text field was sent.
    #[error("No file or text provided")]
    MissingInput,

    /// Request body could not be parsed (truncated multipart, bad JSON,
    /// unsupported content type).
    #[error("Malformed request: {detail}")]
    MalformedUpload { detail: String },

    /// Uploaded file is not a PDF (wrong content type or magic bytes).
    #[error("Only PDF files are allowed!")]
    NotAPdf,

    /// Uploaded file exceeds the configured size limit.
    #[error("File size too large. Maximum size is {}MB.", .limit_bytes / (1024 * 1024))]
    FileTooLarge { limit_bytes: usize },

    /// pdfium could not open or read the document.
    #[error("Failed to extract text from PDF: {detail}")]
    PdfExtraction { detail: String },

    // ── Credential errors ─────────────────────────────────────────────────
    /// API key missing or malformed, or rejected by the provider.
    #[error("Groq API key is invalid or not configured correctly: {reason}")]
    Unauthorized { reason: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// Provider answered with a non-success status.
    #[error("Failed to generate response from Groq: Groq API error: {message}")]
    ProviderError { status: u16, message: String },

    /// Provider reported a rate limit.
    ///
    /// Detection is heuristic (status 429 or "rate limit" in the provider's
    /// free-text message), see [`crate::pipeline::completion`].
    #[error("Groq API rate limit exceeded. Please try again later.")]
    RateLimited { message: String },

    /// Provider answered 2xx but without a usable first choice.
    #[error("Failed to generate response from Groq: Invalid response from Groq API")]
    EmptyCompletion,

    /// Network-level failure: DNS, refused connection, timeout, TLS.
    #[error("Failed to reach Groq API: {reason}")]
    TransportFailure { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected failure, tagged with the stage it happened in.
    #[error("Unexpected error during {stage}: {detail}")]
    Internal { stage: Stage, detail: String },
}

impl StudyError {
    /// Stable machine-readable code, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            StudyError::EmptyInput => "empty_input",
            StudyError::InvalidMode { .. } => "invalid_mode",
            StudyError::MissingInput => "missing_input",
            StudyError::MalformedUpload { .. } => "malformed_upload",
            StudyError::NotAPdf => "not_a_pdf",
            StudyError::FileTooLarge { .. } => "file_too_large",
            StudyError::PdfExtraction { .. } => "pdf_extraction",
            StudyError::Unauthorized { .. } => "unauthorized",
            StudyError::ProviderError { .. } => "provider_error",
            StudyError::RateLimited { .. } => "rate_limited",
            StudyError::EmptyCompletion => "empty_completion",
            StudyError::TransportFailure { .. } => "transport_failure",
            StudyError::InvalidConfig(_) => "invalid_config",
            StudyError::Internal { .. } => "internal",
        }
    }

    /// True when the caller sent something the pipeline refuses to process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StudyError::EmptyInput
                | StudyError::InvalidMode { .. }
                | StudyError::MissingInput
                | StudyError::MalformedUpload { .. }
                | StudyError::NotAPdf
                | StudyError::FileTooLarge { .. }
                | StudyError::PdfExtraction { .. }
        )
    }

    pub(crate) fn internal(stage: Stage, detail: impl fmt::Display) -> Self {
        StudyError::Internal {
            stage,
            detail: detail.to_string(),
        }
    }
}
