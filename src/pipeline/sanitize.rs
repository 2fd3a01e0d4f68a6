//! Response sanitisation: strip reasoning markup and headings from a completion.
//!
//! The system prompt asks the model not to emit `<think>` blocks or markdown
//! headers, and reasoning-tuned models ignore that often enough that the
//! output has to be cleaned anyway. The front end renders the text with
//! `white-space: pre-wrap`, so any leftover `#` or reasoning would show up
//! verbatim.
//!
//! ## Rule Order
//!
//! Reasoning blocks go first: they may contain heading lines of their own.
//! Heading removal runs before blank-line collapsing because deleting a line
//! can create a new run of blank lines. Trimming is last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all sanitisation rules to a raw completion.
///
/// Rules (applied in order):
/// 1. Remove `<think>…</think>` blocks (non-greedy, across lines)
/// 2. Remove whole lines starting with 1–4 `#` and a space or tab
/// 3. Collapse whitespace runs holding 3+ newlines into one blank line
/// 4. Trim leading and trailing whitespace
///
/// The four rules are re-applied until the text stops changing. A single
/// pass is not idempotent: removing `<think>x</think>` from
/// `<th<think>x</think>ink>…</think>` forms a new block, and trimming can
/// move a heading to the start of the text. Every pass that changes the
/// text makes it shorter, so the loop terminates.
pub fn clean_response(input: &str) -> String {
    let mut current = sanitize_once(input);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(input: &str) -> String {
    let s = strip_reasoning(input);
    let s = strip_heading_lines(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Reasoning blocks ─────────────────────────────────────────────────

static RE_THINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

fn strip_reasoning(input: &str) -> String {
    RE_THINK.replace_all(input, "").into_owned()
}

// ── Rule 2: Heading lines ────────────────────────────────────────────────────

// `#####` is not matched: the fifth `#` is not whitespace.
static RE_HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,4}[ \t][^\n]*(?:\n|$)").unwrap());

fn strip_heading_lines(input: &str) -> String {
    RE_HEADING_LINE.replace_all(input, "").into_owned()
}

// ── Rule 3: Blank-line runs ──────────────────────────────────────────────────

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_reasoning_multiline() {
        let input = "<think>\nstep one\nstep two\n</think>Answer";
        assert_eq!(strip_reasoning(input), "Answer");
    }

    #[test]
    fn test_strip_reasoning_non_greedy() {
        let input = "<think>a</think>keep<think>b</think>";
        assert_eq!(strip_reasoning(input), "keep");
    }

    #[test]
    fn test_no_reasoning_is_noop() {
        assert_eq!(strip_reasoning("plain text"), "plain text");
    }

    #[test]
    fn test_unclosed_think_is_kept() {
        assert_eq!(strip_reasoning("<think>never closed"), "<think>never closed");
    }

    #[test]
    fn test_headings_every_level_removed() {
        let input = "# one\n## two\n### three\n#### four\nbody";
        assert_eq!(strip_heading_lines(input), "body");
    }

    #[test]
    fn test_five_hashes_and_hashtags_kept() {
        let input = "##### five\n#hashtag\nC# is a language";
        assert_eq!(strip_heading_lines(input), input);
    }

    #[test]
    fn test_heading_on_last_line() {
        assert_eq!(strip_heading_lines("body\n## tail"), "body\n");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\n b"), "a\n\n b");
    }

    #[test]
    fn test_two_newlines_untouched() {
        assert_eq!(collapse_blank_lines("a\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn test_think_then_blank_lines_scenario() {
        let input = "<think>internal</think>Hello World\n\n\n\nBye";
        assert_eq!(clean_response(input), "Hello World\n\nBye");
    }

    #[test]
    fn test_headings_scenario() {
        let input = "# Title\nSome content\n## Subtitle\nMore content";
        assert_eq!(clean_response(input), "Some content\nMore content");
    }

    #[test]
    fn test_only_reasoning_gives_empty() {
        assert_eq!(clean_response("  <think>\nall of it\n</think>\n "), "");
    }

    #[test]
    fn test_clean_input_only_trimmed() {
        let input = "\n  Question 1: What is DNA?\n\nA) a protein\nB) a nucleic acid  \n";
        assert_eq!(clean_response(input), input.trim());
    }

    #[test]
    fn test_idempotent_on_nested_markers() {
        let input = "<th<think>x</think>ink>hidden</think>visible";
        let once = clean_response(input);
        assert_eq!(once, "visible");
        assert_eq!(clean_response(&once), once);
    }

    #[test]
    fn test_idempotent_when_trim_exposes_heading() {
        let input = "  # Title\nbody";
        let once = clean_response(input);
        assert_eq!(once, "body");
        assert_eq!(clean_response(&once), once);
    }

    #[test]
    fn test_idempotent_on_mixed_input() {
        let input = "<think>plan</think>\n\n# Quiz\n\n\n1. What?\n\n\n\n## Answers\n\n\n\nA";
        let once = clean_response(input);
        assert_eq!(clean_response(&once), once);
        assert!(!once.contains('#'));
        assert!(!once.contains("\n\n\n"));
    }
}
