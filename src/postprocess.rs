//! Post-processing: deterministic cleanup of completion-generated Markdown.
//!
//! Even well-prompted models occasionally introduce artefacts that are
//! semantically fine but structurally noisy: wrapping the whole answer in
//! ` ```markdown ... ``` ` fences, Windows line endings, or runs of blank
//! lines between sections. These rules fix model quirks without touching
//! content, so the prompt can stay focused on *what to generate* rather
//! than on formatting edge-cases. Each rule is independently testable.
//!
//! Rule order matters: strip fences before anything that reasons about
//! lines, normalise line endings before trimming.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw completion output.
///
/// Rules (applied in order):
/// 1. Strip an outer markdown fence wrapping the entire answer
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Strip invisible Unicode (zero-width characters, BOM, word joiners)
/// 6. Ensure the text ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer markdown fence ───────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown)?\n(.*)\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCE.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Strip invisible Unicode ──────────────────────────────────────────

const INVISIBLE: [char; 5] = ['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

// ── Rule 6: Ensure single final newline ──────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whole_answer_fence() {
        let input = "```markdown\n# Quiz\n\n1. Question\n```";
        let out = clean_markdown(input);
        assert!(out.starts_with("# Quiz"));
        assert!(!out.contains("```"));
    }

    #[test]
    fn leaves_inner_code_blocks_alone() {
        let input = "# Notes\n\n```python\nprint(1)\n```\n\nDone.";
        let out = clean_markdown(input);
        assert!(out.contains("```python"));
    }

    #[test]
    fn normalises_crlf_and_trailing_whitespace() {
        let out = clean_markdown("line one   \r\nline two\t\r\n");
        assert_eq!(out, "line one\nline two\n");
    }

    #[test]
    fn collapses_blank_runs() {
        let out = clean_markdown("a\n\n\n\n\n\nb");
        assert!(!out.contains("\n\n\n\n"));
    }

    #[test]
    fn strips_invisible_unicode() {
        let out = clean_markdown("he\u{200B}llo\u{FEFF}");
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn always_exactly_one_trailing_newline() {
        assert_eq!(clean_markdown("x"), "x\n");
        assert_eq!(clean_markdown("x\n\n\n"), "x\n");
        assert_eq!(clean_markdown(""), "\n");
    }
}
