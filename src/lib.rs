//! # study-assistant
//!
//! Turn study material into a quiz, a summary, a podcast script or a
//! tutoring walkthrough with a hosted LLM (Groq's OpenAI-compatible API).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload / raw text
//!  │
//!  ├─ 0. Extract  PDF → plain text via pdfium (HTTP shell and CLI only)
//!  ├─ 1. Mode     "quiz" | "summary" | "podcast" | "tutor"
//!  ├─ 2. Prompt   fixed per-mode preamble + the material verbatim
//!  ├─ 3. Call     one chat-completion request, no retry
//!  ├─ 4. Clean    strip <think> blocks and heading lines, collapse blanks
//!  └─ 5. Return   cleaned text, or a classified StudyError
//! ```
//!
//! Input errors (empty text, unknown mode) and credential errors are raised
//! before the network is touched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use study_assistant::{AssistantConfig, StudyAssistant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AssistantConfig::builder()
//!         .api_key(std::env::var("GROQ_API_KEY")?)
//!         .build()?;
//!     let assistant = StudyAssistant::from_config(&config)?;
//!     let result = assistant
//!         .generate("The mitochondria is the powerhouse of the cell.", "quiz")
//!         .await?;
//!     println!("{}", result.cleaned_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `study-assistant` binary (clap + anyhow + tracing-subscriber + dotenv) |
//!
//! ## Known limitations
//!
//! The provider call is made exactly once, is not cancelled when the client
//! disconnects, and has no timeout unless
//! [`AssistantConfig::request_timeout_secs`] is set.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assistant;
pub mod config;
pub mod error;
pub mod mode;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assistant::{CompletionRequest, CompletionResult, StudyAssistant};
pub use config::{ApiKey, AssistantConfig, AssistantConfigBuilder, ServerConfig};
pub use error::{Stage, StudyError};
pub use mode::Mode;
pub use pipeline::completion::{CompletionTransport, GroqClient};
pub use pipeline::extract::PdfTextExtractor;
pub use pipeline::sanitize::clean_response;
pub use server::{router, AppState};
