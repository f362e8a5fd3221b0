//! Regular expressions for the `~=` operator.
//!
//! Patterns use the [`regex`] crate syntax and are matched the way POSIX
//! `regexec` does without `REG_NEWLINE`: an unanchored search, `.` matches a
//! newline, and `^`/`$` anchor only at the ends of the text. Matching is
//! case-sensitive.

use std::fmt;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Error returned when a pattern cannot be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("regex error: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// A compiled pattern ready for matching.
#[derive(Clone)]
pub struct Pattern {
    src: String,
    regex: Regex,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern").field("src", &self.src).finish()
    }
}

impl Pattern {
    /// Compile `src`.
    ///
    /// Returns [`PatternError`] if the pattern is syntactically invalid.
    pub fn new(src: &str) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(src)
            .case_insensitive(false)
            .dot_matches_new_line(true)
            .multi_line(false)
            .build()?;
        Ok(Self {
            src: src.to_owned(),
            regex,
        })
    }

    /// Returns `true` if the pattern matches anywhere in `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// One-shot match used by `~=`: compile `pattern` and test `text`.
pub fn is_match(pattern: &str, text: &str) -> Result<bool, PatternError> {
    Pattern::new(pattern).map(|p| p.matches(text))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanchored_search() {
        let p = Pattern::new("l+o").unwrap();
        assert!(p.matches("hello world"));
        assert!(!p.matches("help"));
    }

    #[test]
    fn anchors_apply_to_whole_text() {
        let p = Pattern::new("^b$").unwrap();
        assert!(p.matches("b"));
        assert!(!p.matches("a\nb"));
    }

    #[test]
    fn dot_matches_newline() {
        assert!(Pattern::new("a.b").unwrap().matches("a\nb"));
    }

    #[test]
    fn case_sensitive() {
        let p = Pattern::new("Hello").unwrap();
        assert!(p.matches("Hello"));
        assert!(!p.matches("hello"));
    }

    #[test]
    fn extended_syntax() {
        let p = Pattern::new("^(foo|bar)[0-9]{2}$").unwrap();
        assert!(p.matches("bar42"));
        assert!(!p.matches("baz42"));
    }

    #[test]
    fn invalid_pattern() {
        let err = Pattern::new("(unclosed").unwrap_err();
        assert!(err.to_string().starts_with("regex error:"));
        assert!(is_match("[", "x").is_err());
    }

    #[test]
    fn one_shot() {
        assert!(is_match("^ab", "abc").unwrap());
        assert!(!is_match("^bc", "abc").unwrap());
    }
}
