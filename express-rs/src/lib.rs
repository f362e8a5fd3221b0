//! `express`: infix expression compiler and RPN stack evaluator.
//!
//! Expressions mix numbers, quoted strings, variables, the usual C operators
//! (plus `~=` for regex matching) and a small fixed set of built-in
//! functions. Compile once, evaluate many times:
//!
//! ```rust
//! use express::{compile, Value, VarStore};
//!
//! let mut vars = VarStore::new();
//! vars.set_num("n", 4.0);
//! let mut expr = compile("pow(2, n) + strlen('abc')").unwrap();
//! assert_eq!(expr.evaluate(Some(&mut vars)), Value::Num(19.0));
//! ```
//!
//! The host supplies variable values through the [`Lookup`] trait; an
//! identifier the host does not know evaluates to its own name.

pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod pattern;
pub mod var;

pub use error::CompileError;
pub use expr::{compile, CompiledExpr, Compiler, Lookup, Registry, Value};
pub use var::VarStore;
