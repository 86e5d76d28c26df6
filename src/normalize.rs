//! Whitespace normalization for extracted document text
//!
//! Page texts are joined with a newline, every whitespace run collapses to a
//! single space and the result is trimmed. The output is a single flat string
//! ready for prompt construction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Unicode White_Space plus the ASCII separators U+001C..U+001F
    static ref WHITESPACE_RUN: Regex =
        Regex::new(r"[\s\x1c-\x1f]+").expect("whitespace regex must be valid");
}

/// Join page texts with `\n` and normalize the result.
///
/// An empty sequence yields an empty string.
pub fn normalize<S: AsRef<str>>(pages: &[S]) -> String {
    let joined = pages
        .iter()
        .map(|page| page.as_ref())
        .collect::<Vec<_>>()
        .join("\n");

    normalize_text(&joined)
}

/// Collapse whitespace runs in a single string and trim it.
pub fn normalize_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalized(text: &str) {
        assert_eq!(text, text.trim());
        let mut previous_was_space = false;
        for c in text.chars() {
            if c.is_whitespace() {
                assert_eq!(c, ' ', "only plain spaces may survive: {:?}", text);
                assert!(!previous_was_space, "double whitespace in {:?}", text);
                previous_was_space = true;
            } else {
                previous_was_space = false;
            }
        }
    }

    #[test]
    fn test_financial_pages() {
        let pages = ["Revenue:\n1000\n", "  Net   Income: 200"];
        assert_eq!(normalize(&pages), "Revenue: 1000 Net Income: 200");
    }

    #[test]
    fn test_whitespace_only_page() {
        assert_eq!(normalize(&["  \n\t  "]), "");
    }

    #[test]
    fn test_pages_are_separated() {
        assert_eq!(normalize(&["A", "B"]), "A B");
    }

    #[test]
    fn test_empty_input() {
        let pages: Vec<String> = vec![];
        assert_eq!(normalize(&pages), "");
    }

    #[test]
    fn test_carriage_returns_and_tabs() {
        let pages = vec!["Cash\r\nFlow\t\t(Q3)".to_string(), "\r\n".to_string(), "EPS 1.20 ".to_string()];
        assert_eq!(normalize(&pages), "Cash Flow (Q3) EPS 1.20");
    }

    #[test]
    fn test_ascii_separators_collapse() {
        assert_eq!(normalize_text("a\x1fb"), "a b");
        assert_eq!(normalize(&["\x1c Revenue\x1d\x1e", "1000 \x1f"]), "Revenue 1000");
    }

    #[test]
    fn test_output_invariant_holds() {
        let cases: Vec<Vec<&str>> = vec![
            vec![],
            vec![""],
            vec!["", ""],
            vec![" a ", " b "],
            vec!["\u{00a0}lead", "trail\u{2003}"],
            vec!["x\n\n\ny", "\tz\t"],
            vec!["  many     spaces   here  "],
        ];

        for pages in cases {
            assert_normalized(&normalize(&pages));
        }
    }

    #[test]
    fn test_idempotent() {
        let once = normalize(&["  Total assets:\n\n 4,200 ", "\tLiabilities  1,100"]);
        assert_eq!(normalize_text(&once), once);
        assert_eq!(normalize(&[once.as_str()]), once);
    }
}
