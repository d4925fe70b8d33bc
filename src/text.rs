//! Text cleanup for CLI display
//!
//! Extracted PDF text tends to carry ragged whitespace and runs of blank
//! lines. These transforms normalize it for compact terminal output.

/// Default display budget for a single page or full-text block.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;

/// Clean extracted PDF text for display.
///
/// Collapses any run of whitespace to a single space, so hard-wrapped lines
/// rejoin into one. The only exception is a run containing a blank line, which
/// becomes exactly one paragraph break. Leading and trailing whitespace is
/// trimmed. Empty input yields empty output.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            blank_run += 1;
            continue;
        };

        if !out.is_empty() {
            if blank_run > 0 {
                out.push_str("\n\n");
            } else {
                out.push(' ');
            }
        }

        out.push_str(first);
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
        blank_run = 0;
    }

    out
}

/// Truncate text to a maximum length in characters, replacing the tail with an
/// ellipsis marker when it does not fit. The result never exceeds the budget,
/// even when the budget is smaller than the marker itself.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    if max_length <= 3 {
        return ".".repeat(max_length);
    }

    let mut out: String = text.chars().take(max_length - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("   \n \t \n", "")]
    #[case("  a   b\n\n\n\nc  ", "a b\n\nc")]
    #[case("one\ntwo", "one two")]
    #[case("line one\nline two", "line one line two")]
    #[case("one\n\ntwo", "one\n\ntwo")]
    #[case("one\n\n\n\n\ntwo", "one\n\ntwo")]
    #[case("  spaced\tout   words  ", "spaced out words")]
    fn test_clean_text(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_text(input), expected);
    }

    #[test]
    fn test_clean_text_blank_lines_with_spaces() {
        // Blank lines containing only whitespace still count as paragraph breaks
        assert_eq!(clean_text("a\n \t \n \nb"), "a\n\nb");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_text("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_exact_length_unchanged() {
        let text = "x".repeat(50);
        assert_eq!(truncate_text(&text, 50), text);
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "x".repeat(100);
        let truncated = truncate_text(&text, 50);
        assert_eq!(truncated.chars().count(), 50);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_never_exceeds_tiny_budgets() {
        for budget in 0..=5 {
            let out = truncate_text("hello world", budget);
            assert!(
                out.chars().count() <= budget,
                "budget {} produced {:?}",
                budget,
                out
            );
        }
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        let text = "é".repeat(100);
        let truncated = truncate_text(&text, 50);
        assert_eq!(truncated.chars().count(), 50);
        assert!(truncated.ends_with("..."));
    }
}
