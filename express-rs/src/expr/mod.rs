//! Expression compiler and evaluator.
//!
//! Text is scanned into tokens, reordered into reverse Polish notation by a
//! shunting-yard pass, validated, and packaged as a [`CompiledExpr`] that can
//! be evaluated any number of times.
//!
//! # Quick start
//!
//! ```rust
//! use express::expr::{compile, Value};
//!
//! let mut expr = compile("substr('hello', 1, 3)").unwrap();
//! assert_eq!(expr.evaluate(None), Value::Str("ell"));
//! assert_eq!(expr.to_string(), "\"hello\" 1 3 substr/3");
//! ```

pub mod arena;
pub mod builtins;
pub mod compile;
pub mod eval;
pub mod token;
pub mod value;

// Re-exports for convenience.
pub use arena::ScratchStats;
pub use builtins::{Builtin, Registry};
pub use compile::{compile, CompiledExpr, Compiler};
pub use eval::Lookup;
pub use token::{Token, TokenKind};
pub use value::Value;
