//! Runtime value type for compiled expressions.
//!
//! A value is a number, a borrowed piece of text, or nothing. Numbers and
//! text convert into each other implicitly, and every operator and built-in
//! goes through the same three conversions: [`Value::as_number`],
//! [`Value::as_long`] and [`Value::as_text`].
//!
//! The conversions follow the C library rather than Rust's parsers: text is
//! read like `atof`/`atol` (longest numeric prefix, `0` when there is none),
//! and a number asked for as text is the empty string, never a formatted
//! numeral.

use std::cmp::Ordering;
use std::fmt;

/// A runtime value.
///
/// Text is borrowed: from the compiled expression's literal buffer, from the
/// evaluation arena, or (for a returned result) from the expression's result
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value<'a> {
    /// No value ("unassigned").
    #[default]
    None,
    Num(f64),
    Str(&'a str),
}

impl fmt::Display for Value<'_> {
    /// Formats the way the command-line front end prints results.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("NONE"),
            Value::Num(n) if n.is_nan() => {
                f.write_str(if n.is_sign_negative() { "-nan" } else { "nan" })
            }
            Value::Num(n) => write!(f, "{n:.6}"),
            Value::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl<'a> Value<'a> {
    /// Numeric view: `atof` for text, `0` for no value.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Num(n) => *n,
            Value::Str(s) => scan_number(trim_c_space(s)).map_or(0.0, |(n, _)| n),
            Value::None => 0.0,
        }
    }

    /// Integer view used by `%`, shifts and bitwise operators.
    ///
    /// Numbers truncate toward zero (saturating at the `i64` range, NaN is
    /// `0`); text is read like `atol`.
    pub fn as_long(&self) -> i64 {
        match self {
            Value::Num(n) => *n as i64,
            Value::Str(s) => scan_long(s),
            Value::None => 0,
        }
    }

    /// Text view. Numbers and no-value are the empty string.
    pub fn as_text(&self) -> &'a str {
        match self {
            Value::Str(s) => s,
            Value::Num(_) | Value::None => "",
        }
    }

    /// Truth test used by `!` and `case()`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::None => false,
        }
    }

    pub fn is_num(&self) -> bool {
        matches!(self, Value::Num(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
        }
    }

    /// Relational comparison shared by `<`, `==`, `in()` and friends.
    ///
    /// Compares numerically when *either* side is a number, otherwise
    /// byte-wise as text. A non-numeric string against a number therefore
    /// compares as `0`. `None` is returned only for NaN operands.
    pub fn cmp_value(&self, rhs: &Value<'_>) -> Option<Ordering> {
        if self.is_num() || rhs.is_num() {
            self.as_number().partial_cmp(&rhs.as_number())
        } else {
            Some(self.as_text().cmp(rhs.as_text()))
        }
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Num(if b { 1.0 } else { 0.0 })
    }
}

// ── C-compatible numeric scanning ────────────────────────────────────────────

/// `isspace` in the C locale.
fn trim_c_space(s: &str) -> &str {
    s.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r'))
}

/// Scan the longest floating-point prefix of `text`, `strtod`-style.
///
/// Accepts an optional sign, then a `0x` hexadecimal integer, `inf`,
/// `infinity`, `nan` (any case), or a decimal mantissa with an optional
/// exponent. Leading whitespace is *not* skipped. Returns the value and the
/// number of bytes consumed, or `None` when no digits were found.
pub fn scan_number(text: &str) -> Option<(f64, usize)> {
    let b = text.as_bytes();
    let mut i = 0;
    let negative = match b.first() {
        Some(b'-') => {
            i = 1;
            true
        }
        Some(b'+') => {
            i = 1;
            false
        }
        _ => false,
    };
    let signed = |v: f64| if negative { -v } else { v };

    if b.get(i) == Some(&b'0') && matches!(b.get(i + 1), Some(b'x' | b'X')) {
        let digits = b[i + 2..].iter().take_while(|c| c.is_ascii_hexdigit()).count();
        if digits > 0 {
            let v = b[i + 2..i + 2 + digits]
                .iter()
                .filter_map(|&c| (c as char).to_digit(16))
                .fold(0.0, |acc, d| acc * 16.0 + f64::from(d));
            return Some((signed(v), i + 2 + digits));
        }
        // "0x" without hex digits reads as the "0" alone.
    }

    for word in ["infinity", "inf", "nan"] {
        let end = i + word.len();
        if b.get(i..end).is_some_and(|w| w.eq_ignore_ascii_case(word.as_bytes())) {
            let v = if word == "nan" { f64::NAN } else { f64::INFINITY };
            return Some((signed(v), end));
        }
    }

    let start = i;
    let int_digits = count_digits(&b[i..]);
    i += int_digits;
    let mut frac_digits = 0;
    if b.get(i) == Some(&b'.') {
        frac_digits = count_digits(&b[i + 1..]);
        if int_digits + frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = count_digits(&b[j..]);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }

    let v: f64 = text[start..i].parse().ok()?;
    Some((signed(v), i))
}

/// `atol`: optional whitespace and sign, then decimal digits; `0` if none.
fn scan_long(text: &str) -> i64 {
    let s = trim_c_space(text);
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = &rest[..count_digits(rest.as_bytes())];
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    }
}

fn count_digits(b: &[u8]) -> usize {
    b.iter().take_while(|c| c.is_ascii_digit()).count()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
