//! The four transformation intents a caller can ask for.

use crate::error::StudyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the model should turn the study material into.
///
/// Parsing is case-sensitive: `"quiz"` is valid, `"Quiz"` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Multiple choice, true/false and short-answer questions.
    Quiz,
    /// Key points, main concepts and important details.
    Summary,
    /// A conversational podcast script.
    Podcast,
    /// A step-by-step explanation with examples and analogies.
    Tutor,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Quiz, Mode::Summary, Mode::Podcast, Mode::Tutor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Quiz => "quiz",
            Mode::Summary => "summary",
            Mode::Podcast => "podcast",
            Mode::Tutor => "tutor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| StudyError::InvalidMode { mode: s.to_string() })
    }
}
