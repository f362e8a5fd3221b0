//! Variable definitions file parser.
//!
//! One definition per line:
//!
//! | Line | Action |
//! |------|--------|
//! | `name = value` or `name=value` | define a variable |
//! | Lines starting with `;` or `#` | comment, ignored |
//! | Blank lines | ignored |
//!
//! A value that reads completely as a number (`42`, `-1.5e3`, `0x1f`) is a
//! number. `"..."` is a string with backslash escapes, `'...'` a string
//! taken literally, and anything else is the trimmed text as a string.

use std::path::Path;

use tracing::debug;

use crate::expr::value::scan_number;
use crate::var::{VarStore, VarValue};

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a definitions file.
#[derive(Debug)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Parsed definitions.
#[derive(Debug, Default)]
pub struct Config {
    pub vars: VarStore,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse definitions from a string.
    ///
    /// Bad lines are skipped; the config and a list of their errors are
    /// returned together.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            match parse_definition(line) {
                Ok((name, value)) => config.vars.set(name, value),
                Err(message) => errors.push(ConfigError {
                    line: i + 1,
                    message,
                }),
            }
        }

        (config, errors)
    }

    /// Read and parse a definitions file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        let (config, errors) = Self::load_str(&s);
        debug!(
            path = %path.display(),
            vars = config.vars.len(),
            errors = errors.len(),
            "loaded definitions"
        );
        Ok((config, errors))
    }
}

/// Parse one `name = value` definition.
pub fn parse_definition(text: &str) -> Result<(String, VarValue), String> {
    let Some((name, value)) = text.split_once('=') else {
        return Err(format!("expected 'name = value', got '{}'", text.trim()));
    };
    let name = name.trim();
    if !is_identifier(name) {
        return Err(format!("invalid variable name '{name}'"));
    }
    Ok((name.to_owned(), parse_value(value)?))
}

/// Interpret the right-hand side of a definition.
pub fn parse_value(text: &str) -> Result<VarValue, String> {
    let text = text.trim();

    if let Some(quote @ ('"' | '\'')) = text.chars().next() {
        let inner = text[1..]
            .strip_suffix(quote)
            .ok_or_else(|| format!("unterminated string {text}"))?;
        return Ok(if quote == '"' {
            VarValue::Str(unescape(inner))
        } else {
            VarValue::Str(inner.to_owned())
        });
    }

    match scan_number(text) {
        Some((n, len)) if len == text.len() => Ok(VarValue::Num(n)),
        _ => Ok(VarValue::Str(text.to_owned())),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Same character set the expression scanner accepts for identifiers.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

/// Drop backslashes, keeping the character each one escapes.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn str_val(s: &str) -> VarValue {
        VarValue::Str(s.to_owned())
    }

    // -- values ---------------------------------------------------------------

    #[test]
    fn numbers() {
        assert_eq!(parse_value("42"), Ok(VarValue::Num(42.0)));
        assert_eq!(parse_value(" -1.5e3 "), Ok(VarValue::Num(-1500.0)));
        assert_eq!(parse_value("0x1f"), Ok(VarValue::Num(31.0)));
    }

    #[test]
    fn partial_numbers_are_text() {
        assert_eq!(parse_value("12abc"), Ok(str_val("12abc")));
        assert_eq!(parse_value("1 2"), Ok(str_val("1 2")));
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(parse_value(r#""say \"hi\"""#), Ok(str_val(r#"say "hi""#)));
        assert_eq!(parse_value(r"'C:\temp'"), Ok(str_val(r"C:\temp")));
        assert_eq!(parse_value("'42'"), Ok(str_val("42")));
        assert_eq!(parse_value(r#""""#), Ok(str_val("")));
    }

    #[test]
    fn unterminated_quote() {
        assert!(parse_value("'open").is_err());
        assert!(parse_value("\"").is_err());
    }

    #[test]
    fn bare_text() {
        assert_eq!(parse_value("  hello world  "), Ok(str_val("hello world")));
        assert_eq!(parse_value(""), Ok(str_val("")));
    }

    // -- definitions ----------------------------------------------------------

    #[test]
    fn definition_forms() {
        assert_eq!(parse_definition("x=1"), Ok(("x".into(), VarValue::Num(1.0))));
        assert_eq!(
            parse_definition("user.name = 'bob'"),
            Ok(("user.name".into(), str_val("bob")))
        );
        // Only the first '=' separates.
        assert_eq!(parse_definition("eq = a=b"), Ok(("eq".into(), str_val("a=b"))));
    }

    #[test]
    fn bad_definitions() {
        assert!(parse_definition("novalue").is_err());
        assert!(parse_definition("= 1").is_err());
        assert!(parse_definition("2x = 1").is_err());
        assert!(parse_definition("a b = 1").is_err());
    }

    // -- files ----------------------------------------------------------------

    #[test]
    fn comments_and_blank_lines_ignored() {
        let (cfg, errs) = Config::load_str(
            "; a comment\n\
             # another\n\
             \n\
             real = yes",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("real"), Some(&str_val("yes")));
        assert_eq!(cfg.vars.len(), 1);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (cfg, errs) = Config::load_str("a = 1\nbroken\nb = 'x\nc = 3");
        assert_eq!(cfg.vars.len(), 2);
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].line, 2);
        assert_eq!(errs[1].line, 3);
        assert!(errs[0].to_string().starts_with("line 2: "));
    }

    #[test]
    fn later_definitions_win() {
        let (cfg, errs) = Config::load_str("x = 1\nx = 2");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("x"), Some(&VarValue::Num(2.0)));
    }

    #[test]
    fn realistic_file() {
        let src = "\
; player state\n\
name = \"Ana \\\"the bold\\\"\"\n\
level = 12\n\
ratio = 0.75\n\
guild = 'red hand'\n\
title = Knight of the Realm\n\
";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("name"), Some(&str_val("Ana \"the bold\"")));
        assert_eq!(cfg.vars.get("level"), Some(&VarValue::Num(12.0)));
        assert_eq!(cfg.vars.get("ratio"), Some(&VarValue::Num(0.75)));
        assert_eq!(cfg.vars.get("guild"), Some(&str_val("red hand")));
        assert_eq!(cfg.vars.get("title"), Some(&str_val("Knight of the Realm")));
    }

    #[test]
    fn load_file_missing_is_io_error() {
        assert!(Config::load_file(Path::new("/definitely/not/here.vars")).is_err());
    }
}
