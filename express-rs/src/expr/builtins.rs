//! Built-in functions and the registry that resolves them.
//!
//! The set is fixed. Names are resolved once, at compile time, and the
//! resolved [`Builtin`] is stored on the call instruction, so evaluation
//! dispatches through a plain function pointer. Argument counts are checked
//! against `min..=max` by the compiler's validation pass; the functions below
//! rely on that and index their arguments directly.

use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bumpalo::Bump;

use super::value::Value;

/// Signature shared by every built-in. String results that are not slices
/// of an argument are allocated in `arena`.
pub type BuiltinFn = for<'a> fn(args: &[Value<'a>], arena: &'a Bump) -> Value<'a>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub call: BuiltinFn,
    pub min: usize,
    pub max: usize,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

impl Builtin {
    pub fn accepts(&self, argc: usize) -> bool {
        (self.min..=self.max).contains(&argc)
    }
}

// Sorted by name; `Registry::get` binary-searches it.
static BUILTINS: [Builtin; 8] = [
    Builtin { name: "case", call: fn_case, min: 3, max: 3 },
    Builtin { name: "in", call: fn_in, min: 2, max: usize::MAX },
    Builtin { name: "pow", call: fn_pow, min: 2, max: 2 },
    Builtin { name: "strcmp", call: fn_strcmp, min: 2, max: 2 },
    Builtin { name: "strlen", call: fn_strlen, min: 1, max: 1 },
    Builtin { name: "strstr", call: fn_strstr, min: 2, max: 2 },
    Builtin { name: "substr", call: fn_substr, min: 2, max: 3 },
    Builtin { name: "time", call: fn_time, min: 0, max: 0 },
];

/// Immutable name → built-in table.
///
/// Create one with [`Registry::standard`] and hand it to
/// [`Compiler::new`](super::compile::Compiler::new).
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    entries: &'static [Builtin],
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Registry {
    /// The standard built-in set.
    pub fn standard() -> Self {
        Registry { entries: &BUILTINS }
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&'static Builtin> {
        let entries: &'static [Builtin] = self.entries;
        entries
            .binary_search_by(|b| b.name.cmp(name))
            .ok()
            .map(|i| &entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Builtin> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Implementations ──────────────────────────────────────────────────────────

fn ordering_value(ord: Ordering) -> f64 {
    match ord {
        Ordering::Less => -1.0,
        Ordering::Equal => 0.0,
        Ordering::Greater => 1.0,
    }
}

fn fn_strcmp<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert_eq!(args.len(), 2);
    Value::Num(ordering_value(args[0].as_text().cmp(args[1].as_text())))
}

fn fn_strlen<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert_eq!(args.len(), 1);
    Value::Num(args[0].as_text().chars().count() as f64)
}

/// The tail of `a` starting at the first occurrence of `b`, or `""`.
fn fn_strstr<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert_eq!(args.len(), 2);
    let haystack = args[0].as_text();
    match haystack.find(args[1].as_text()) {
        Some(i) => Value::Str(&haystack[i..]),
        None => Value::Str(""),
    }
}

fn fn_pow<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert_eq!(args.len(), 2);
    Value::Num(args[0].as_number().powf(args[1].as_number()))
}

/// `in(x, a, b, ...)`: 1 if `x == a || x == b || ...` under the `==` rules.
fn fn_in<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert!(args.len() >= 2);
    let needle = args[0];
    Value::from(
        args[1..]
            .iter()
            .any(|v| needle.cmp_value(v) == Some(Ordering::Equal)),
    )
}

/// `case(c, a, b)`: `a` if `c` is truthy, else `b`.
fn fn_case<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert_eq!(args.len(), 3);
    if args[0].is_truthy() {
        args[1]
    } else {
        args[2]
    }
}

fn fn_time<'a>(args: &[Value<'a>], _arena: &'a Bump) -> Value<'a> {
    debug_assert!(args.is_empty());
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Value::Num(secs as f64)
}

/// `substr(s, off[, len])`, counting in characters.
///
/// A negative `off` counts back from the end. An offset still outside the
/// string, or a non-positive length, gives `""`; a length running past the
/// end is clamped.
fn fn_substr<'a>(args: &[Value<'a>], arena: &'a Bump) -> Value<'a> {
    debug_assert!(args.len() == 2 || args.len() == 3);
    let s = args[0].as_text();
    let n = s.chars().count() as i64;

    let mut off = args[1].as_long();
    if off < 0 {
        off = off.saturating_add(n);
    }
    if off < 0 || off >= n {
        return Value::Str("");
    }

    let len = args.get(2).map_or(n, Value::as_long).min(n - off);
    if len <= 0 {
        return Value::Str("");
    }

    let start = char_offset(s, off as usize);
    let end = char_offset(s, (off + len) as usize);
    Value::Str(arena.alloc_str(&s[start..end]))
}

/// Byte index of the `nth` character, or `s.len()` past the end.
fn char_offset(s: &str, nth: usize) -> usize {
    s.char_indices().nth(nth).map_or(s.len(), |(i, _)| i)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
