//! Stack-machine evaluator for compiled RPN programs.
//!
//! One pass over the instructions. Each instruction reads the top `argc`
//! slots of the operand stack, writes its result over the first of them, and
//! leaves the stack `1 - argc` slots deeper. The stack itself, strings copied
//! in from the host, and string results of built-ins all live in the
//! expression's scratch arena, which is emptied before `evaluate` returns.

use std::cmp::Ordering;

use bumpalo::Bump;
use tracing::{debug, trace};

use super::compile::CompiledExpr;
use super::token::{Payload, Token, TokenKind};
use super::value::Value;
use crate::pattern;

/// Supplies variable values to [`CompiledExpr::evaluate`].
///
/// Called once per identifier instruction executed; results are not cached.
/// Returning [`Value::None`] makes the identifier evaluate to its own name.
pub trait Lookup {
    fn lookup(&mut self, name: &str) -> Value<'_>;
}

impl CompiledExpr {
    /// Run the program and return its single result.
    ///
    /// The result borrows from `self` and stays valid until the next call.
    /// With no `lookup`, every identifier evaluates to its own name.
    pub fn evaluate(&mut self, lookup: Option<&mut dyn Lookup>) -> Value<'_> {
        {
            let (arena, slot) = self.scratch.begin();
            let result = run(&self.insns, &self.strings, self.depth, arena, lookup);
            slot.store(result);
        }
        self.scratch.sweep();

        let result = self.scratch.result();
        trace!(
            kind = result.type_name(),
            arena_bytes = self.scratch.stats().last_used,
            "evaluated expression"
        );
        result
    }
}

fn run<'v>(
    insns: &[Token],
    strings: &'v str,
    depth: usize,
    arena: &'v Bump,
    mut lookup: Option<&mut dyn Lookup>,
) -> Value<'v> {
    let stack = arena.alloc_slice_fill_copy(depth.max(1), Value::None);
    let mut sp = 0usize;

    for tok in insns {
        assert!(sp >= tok.argc, "operand stack underflow at `{}`", tok.name());
        let base = sp - tok.argc;
        let args = &stack[base..sp];

        let value = match (tok.kind, tok.payload) {
            (TokenKind::Num, Payload::Num(n)) => Value::Num(n),
            (TokenKind::Str, Payload::Span(span)) => Value::Str(span.text(strings)),
            (TokenKind::Ident, Payload::Span(span)) => {
                resolve(span.text(strings), lookup.as_deref_mut(), arena)
            }
            (TokenKind::Func, _) => match tok.func {
                Some(func) => (func.call)(args, arena),
                None => unreachable!("call instruction without a resolved builtin"),
            },
            (TokenKind::Not | TokenKind::BitNot, _) => unary(tok.kind, args[0]),
            (kind, _) if kind.arity() == 2 => binary(kind, args[0], args[1]),
            (kind, _) => unreachable!("non-executable token `{}` in program", kind.symbol()),
        };

        stack[base] = value;
        sp = base + 1;
    }

    assert_eq!(sp, 1, "program left {sp} operands");
    stack[0]
}

/// Identifier value: the host's answer, or the name itself.
fn resolve<'v>(
    name: &'v str,
    host: Option<&mut (dyn Lookup + '_)>,
    arena: &'v Bump,
) -> Value<'v> {
    match host.map(|h| h.lookup(name)) {
        Some(Value::Num(n)) => Value::Num(n),
        Some(Value::Str(s)) => Value::Str(arena.alloc_str(s)),
        Some(Value::None) | None => Value::Str(name),
    }
}

fn unary<'v>(kind: TokenKind, a: Value<'v>) -> Value<'v> {
    match kind {
        TokenKind::Not => Value::from(!a.is_truthy()),
        TokenKind::BitNot => Value::Num(!a.as_long() as f64),
        _ => unreachable!("`{}` is not unary", kind.symbol()),
    }
}

fn binary<'v>(kind: TokenKind, a: Value<'v>, b: Value<'v>) -> Value<'v> {
    use TokenKind::*;

    let long = |f: fn(i64, i64) -> i64| Value::Num(f(a.as_long(), b.as_long()) as f64);
    let ord = || a.cmp_value(&b);

    match kind {
        Mul => Value::Num(a.as_number() * b.as_number()),
        Div => Value::Num(a.as_number() / b.as_number()),
        Add => Value::Num(a.as_number() + b.as_number()),
        Sub => Value::Num(a.as_number() - b.as_number()),
        Mod => match b.as_long() {
            0 => Value::Num(f64::NAN),
            y => Value::Num(a.as_long().wrapping_rem(y) as f64),
        },
        Shl => long(|x, y| x << (y & 63)),
        Shr => long(|x, y| x >> (y & 63)),
        BitAnd => long(|x, y| x & y),
        BitXor => long(|x, y| x ^ y),
        BitOr => long(|x, y| x | y),
        And => Value::from(a.as_number() != 0.0 && b.as_number() != 0.0),
        Or => Value::from(a.as_number() != 0.0 || b.as_number() != 0.0),
        Lt => Value::from(ord() == Some(Ordering::Less)),
        Le => Value::from(matches!(ord(), Some(Ordering::Less | Ordering::Equal))),
        Gt => Value::from(ord() == Some(Ordering::Greater)),
        Ge => Value::from(matches!(ord(), Some(Ordering::Greater | Ordering::Equal))),
        Eq => Value::from(ord() == Some(Ordering::Equal)),
        Ne => Value::from(ord() != Some(Ordering::Equal)),
        Match => Value::from(match a {
            Value::Str(text) => regex_match(b.as_text(), text),
            _ => false,
        }),
        _ => unreachable!("`{}` is not binary", kind.symbol()),
    }
}

/// `~=`: the pattern is compiled on every evaluation. A bad pattern is no
/// match.
fn regex_match(re: &str, text: &str) -> bool {
    pattern::is_match(re, text).unwrap_or_else(|e| {
        debug!(pattern = re, error = %e, "bad ~= pattern");
        false
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
