//! Prompt templates for study-artifact generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: changing the output conventions (heading
//!    style, section ordering) requires editing exactly one place.
//!
//! 2. **Testability**: unit tests can inspect the composed prompt directly
//!    without calling a real completion API, so template regressions are
//!    caught cheaply.
//!
//! [`build_prompt`] is a pure function: no I/O, no clock, no randomness.
//! The system instruction asks the model for structured Markdown; nothing
//! downstream validates that the model complied.

use crate::mode::Mode;

/// Fixed system instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful study assistant. \
Be clear, step-by-step, and student-friendly. \
Use headings and bullet points when useful.";

/// A composed request: fixed system instruction plus the mode-specific user
/// instruction with the notes interpolated verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Compose the prompt for the given notes and mode.
pub fn build_prompt(notes: &str, mode: Mode) -> Prompt {
    let user = match mode {
        Mode::Explain => format!(
            "Explain these notes step-by-step. Then give 3 example questions \
             with worked solutions.\n\nNOTES:\n{notes}"
        ),
        Mode::Quiz => format!(
            "Create a quiz from these notes: 8 multiple choice and 3 short \
             answer. Include an answer key.\n\nNOTES:\n{notes}"
        ),
        Mode::Practice => format!(
            "Generate 5 practice problems based on these notes (easy → harder). \
             Provide worked solutions for each.\n\nNOTES:\n{notes}"
        ),
    };

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_interpolated_verbatim() {
        let notes = "F = ma\n  (Newton's 2nd law)";
        for mode in Mode::ALL {
            let p = build_prompt(notes, mode);
            assert!(p.user.contains(notes), "{mode}: notes mangled");
            assert!(p.user.ends_with(notes), "{mode}: notes must come last");
        }
    }

    #[test]
    fn system_instruction_is_mode_independent() {
        let a = build_prompt("notes", Mode::Explain);
        let b = build_prompt("notes", Mode::Practice);
        assert_eq!(a.system, b.system);
        assert_eq!(a.system, SYSTEM_PROMPT);
    }

    #[test]
    fn quiz_template_asks_for_answer_key() {
        let p = build_prompt("the mitochondria", Mode::Quiz);
        assert!(p.user.contains("8 multiple choice"));
        assert!(p.user.contains("answer key"));
    }

    #[test]
    fn deterministic() {
        let a = build_prompt("derivative rules", Mode::Explain);
        let b = build_prompt("derivative rules", Mode::Explain);
        assert_eq!(a, b);
    }
}
