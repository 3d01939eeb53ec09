//! Generation modes.
//!
//! The mode selects which prompt template [`crate::prompts::build_prompt`]
//! uses; it has no other behavioural effect anywhere in the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three fixed generation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Step-by-step explanation plus worked example questions.
    Explain,
    /// Multiple-choice + short-answer quiz with an answer key.
    Quiz,
    /// Graded practice problems with worked solutions.
    Practice,
}

impl Mode {
    /// All recognised modes, in UI order.
    pub const ALL: [Mode; 3] = [Mode::Explain, Mode::Quiz, Mode::Practice];

    /// The wire / CLI name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Explain => "explain",
            Mode::Quiz => "quiz",
            Mode::Practice => "practice",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed from the exact lowercase wire names; anything else is rejected so
/// the HTTP boundary can answer 400 rather than guessing.
impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explain" => Ok(Mode::Explain),
            "quiz" => Ok(Mode::Quiz),
            "practice" => Ok(Mode::Practice),
            _ => Err(()),
        }
    }
}
