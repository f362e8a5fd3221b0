//! Compile-time errors.
//!
//! Evaluation has no error channel: once an expression compiles, every run
//! produces a value. Everything that can go wrong with user input is caught
//! here, before a [`CompiledExpr`](crate::CompiledExpr) exists.

use thiserror::Error;

/// Why an expression failed to compile.
///
/// Offsets are byte positions in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("malformed number at offset {pos}")]
    InvalidNumber { pos: usize },

    #[error("unterminated string starting at offset {pos}")]
    UnterminatedString { pos: usize },

    #[error("unknown function `{name}` at offset {pos}")]
    UnknownFunction { name: String, pos: usize },

    #[error("unbalanced parenthesis at offset {pos}")]
    UnbalancedParen { pos: usize },

    #[error("argument separator outside a function call at offset {pos}")]
    MisplacedSeparator { pos: usize },

    #[error("`{op}` at offset {pos} is missing an operand")]
    MissingOperand { op: &'static str, pos: usize },

    #[error("{name}() takes {}, got {got}", arity_range(.min, .max))]
    Arity {
        name: &'static str,
        got: usize,
        min: usize,
        max: usize,
    },

    #[error("expression leaves {operands} values instead of one")]
    Malformed { operands: usize },
}

fn arity_range(min: &usize, max: &usize) -> String {
    match (*min, *max) {
        (0, 0) => "no arguments".to_owned(),
        (lo, hi) if lo == hi => format!("{lo} arguments"),
        (lo, usize::MAX) => format!("at least {lo} arguments"),
        (lo, hi) => format!("{lo} to {hi} arguments"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_messages() {
        let e = CompileError::Arity { name: "time", got: 1, min: 0, max: 0 };
        assert_eq!(e.to_string(), "time() takes no arguments, got 1");
        let e = CompileError::Arity { name: "in", got: 1, min: 2, max: usize::MAX };
        assert_eq!(e.to_string(), "in() takes at least 2 arguments, got 1");
        let e = CompileError::Arity { name: "substr", got: 4, min: 2, max: 3 };
        assert_eq!(e.to_string(), "substr() takes 2 to 3 arguments, got 4");
    }

    #[test]
    fn positions_in_messages() {
        let e = CompileError::UnknownFunction { name: "nope".into(), pos: 4 };
        assert_eq!(e.to_string(), "unknown function `nope` at offset 4");
    }
}
