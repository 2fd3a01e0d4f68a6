//! Prompt templates for the four study modes.
//!
//! Every instruction the model sees lives here: the shared system prompt and
//! one preamble per [`Mode`].
//!
//! Callers can override the system prompt via
//! [`crate::config::AssistantConfig::system_prompt`]; the preambles are fixed.

use crate::error::StudyError;
use crate::mode::Mode;

/// Default system prompt sent ahead of every user prompt.
///
/// Models from the reasoning family still emit `<think>` blocks now and
/// then; [`crate::pipeline::sanitize`] removes whatever slips through.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI study assistant. Provide direct, \
concise responses without any thinking text (nothing between <think> tags) or markdown headers \
(#, ##, ###, ####). Focus on delivering clear, structured information without any \
meta-commentary, thinking steps, or markdown formatting.";

pub const QUIZ_PREAMBLE: &str = "Create a quiz based on the following study material. Include \
multiple choice questions, true/false questions, and short answer questions. Format the response \
in a clear, structured way";

pub const SUMMARY_PREAMBLE: &str = "Provide a comprehensive summary of the following study \
material. Include key points, main concepts, and important details";

pub const PODCAST_PREAMBLE: &str = "Create a podcast script based on the following study \
material. Make it engaging and conversational, as if explaining the concepts to a friend";

pub const TUTOR_PREAMBLE: &str = "Act as a personal tutor and explain the following study \
material in a clear, step-by-step manner. Include examples and analogies to help with \
understanding";

/// Instructional preamble for a mode.
pub fn preamble(mode: Mode) -> &'static str {
    match mode {
        Mode::Quiz => QUIZ_PREAMBLE,
        Mode::Summary => SUMMARY_PREAMBLE,
        Mode::Podcast => PODCAST_PREAMBLE,
        Mode::Tutor => TUTOR_PREAMBLE,
    }
}

/// Build the user prompt: preamble, a blank line, then the material verbatim.
///
/// The text is checked for emptiness after trimming but is inserted
/// untrimmed.
pub fn build_prompt(mode: Mode, text: &str) -> Result<String, StudyError> {
    if text.trim().is_empty() {
        return Err(StudyError::EmptyInput);
    }
    Ok(format!("{}:\n\n{}", preamble(mode), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_mode_embeds_the_literal_text() {
        let text = "Photosynthesis converts light into chemical energy.";
        for mode in Mode::ALL {
            let prompt = build_prompt(mode, text).unwrap();
            assert!(prompt.contains(text), "{mode}: {prompt}");
            assert!(prompt.starts_with(preamble(mode)));
        }
    }

    #[test]
    fn preambles_are_pairwise_distinct() {
        let set: HashSet<_> = Mode::ALL.iter().map(|m| preamble(*m)).collect();
        assert_eq!(set.len(), Mode::ALL.len());
    }

    #[test]
    fn empty_and_whitespace_text_rejected() {
        for text in ["", "   ", "\n\t \n"] {
            assert!(matches!(
                build_prompt(Mode::Summary, text),
                Err(StudyError::EmptyInput)
            ));
        }
    }

    #[test]
    fn text_is_inserted_untrimmed() {
        let prompt = build_prompt(Mode::Tutor, "  indented\n").unwrap();
        assert!(prompt.ends_with(":\n\n  indented\n"));
    }

    #[test]
    fn system_prompt_forbids_think_tags_and_headers() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("<think>"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("####"));
    }
}
