//! Pipeline stages for turning study material into a cleaned completion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompt ──▶ completion ──▶ sanitize
//! (PDF→text)  (mode)     (Groq)         (cleanup)
//! ```
//!
//! 1. [`extract`]: PDF bytes to plain text; runs in `spawn_blocking`.
//!    Only used by the HTTP shell and CLI.
//! 2. [`crate::prompts`]: mode preamble + material
//! 3. [`completion`]: the single network call and its error classification
//! 4. [`sanitize`]: deterministic removal of reasoning markup and headings

pub mod completion;
pub mod extract;
pub mod sanitize;
