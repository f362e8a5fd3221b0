//! Shunting-yard compiler: infix tokens → validated RPN program.
//!
//! See <http://en.wikipedia.org/wiki/Shunting-yard_algorithm>. Operands go
//! straight to the output; operators wait on a working stack until something
//! of lower precedence (or a closing parenthesis, separator or end of input)
//! flushes them. Function calls sit under their opening parenthesis on the
//! working stack and count their arguments as separators and the closing
//! parenthesis go by.
//!
//! A replay of the finished program then checks that every operator has its
//! operands, that every call's argument count is in range, and that exactly
//! one value is left at the end. Only programs that pass become a
//! [`CompiledExpr`], which is what lets the evaluator treat stack underflow
//! as a bug rather than an error.

use std::fmt;

use tracing::debug;

use super::arena::{Scratch, ScratchStats};
use super::builtins::Registry;
use super::token::{Lexer, Payload, Span, Token, TokenKind};
use crate::error::CompileError;

/// Compiles expressions against a function [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r Registry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Compiler { registry }
    }

    /// Parse, validate, and assemble `src`.
    pub fn compile(&self, src: &str) -> Result<CompiledExpr, CompileError> {
        let compiled = self
            .to_rpn(src)
            .and_then(|rpn| validate(&rpn).map(|depth| CompiledExpr::assemble(src, rpn, depth)));
        match &compiled {
            Ok(expr) => debug!(
                len = src.len(),
                insns = expr.insns.len(),
                depth = expr.depth,
                "compiled expression"
            ),
            Err(e) => debug!(error = %e, "compile failed"),
        }
        compiled
    }

    fn to_rpn(&self, src: &str) -> Result<Vec<Token>, CompileError> {
        let mut lexer = Lexer::new(src, self.registry);
        let mut out: Vec<Token> = Vec::new();
        let mut ops: Vec<Token> = Vec::new();

        loop {
            let prev = lexer.prev();
            let Some(tok) = lexer.next_token()? else {
                break;
            };
            match tok.kind {
                TokenKind::Num | TokenKind::Str | TokenKind::Ident => out.push(tok),
                TokenKind::Open | TokenKind::Func => ops.push(tok),
                TokenKind::Sep => end_argument(&mut out, &mut ops, tok.pos)?,
                TokenKind::Close => close_group(&mut out, &mut ops, prev, tok.pos)?,
                _ => push_operator(&mut out, &mut ops, tok),
            }
        }

        if lexer.prev().is_none() {
            return Err(CompileError::Empty);
        }
        while let Some(tok) = ops.pop() {
            if tok.kind == TokenKind::Open {
                return Err(CompileError::UnbalancedParen { pos: tok.pos });
            }
            out.push(tok);
        }
        Ok(out)
    }
}

/// Pop operators that bind at least as tightly as `tok`, then stack it.
fn push_operator(out: &mut Vec<Token>, ops: &mut Vec<Token>, tok: Token) {
    let level = tok.kind.level();
    while let Some(&top) = ops.last() {
        let pops = top.kind.is_operator()
            && (top.kind.level() > level
                || (top.kind.level() == level && tok.kind.is_left_assoc()));
        if !pops {
            break;
        }
        ops.pop();
        out.push(top);
    }
    ops.push(tok);
}

/// `,`: flush the current argument and count it against the enclosing call.
fn end_argument(out: &mut Vec<Token>, ops: &mut Vec<Token>, pos: usize) -> Result<(), CompileError> {
    while let Some(&top) = ops.last() {
        if top.kind == TokenKind::Open {
            break;
        }
        ops.pop();
        out.push(top);
    }
    // The call sits directly beneath its `(`.
    match ops.len().checked_sub(2) {
        Some(i) if ops[i].kind == TokenKind::Func => {
            ops[i].argc += 1;
            Ok(())
        }
        _ => Err(CompileError::MisplacedSeparator { pos }),
    }
}

/// `)`: flush to the matching `(`, and close the call beneath it, if any.
fn close_group(
    out: &mut Vec<Token>,
    ops: &mut Vec<Token>,
    prev: Option<TokenKind>,
    pos: usize,
) -> Result<(), CompileError> {
    loop {
        match ops.pop() {
            None => return Err(CompileError::UnbalancedParen { pos }),
            Some(tok) if tok.kind == TokenKind::Open => break,
            Some(tok) => out.push(tok),
        }
    }
    if ops.last().is_some_and(|t| t.kind == TokenKind::Func) {
        if let Some(mut call) = ops.pop() {
            // `f()` has no arguments; otherwise the last one is still uncounted.
            if prev != Some(TokenKind::Open) {
                call.argc += 1;
            }
            out.push(call);
        }
    }
    Ok(())
}

/// Replay `rpn` on a simulated stack. Returns the deepest stack reached.
fn validate(rpn: &[Token]) -> Result<usize, CompileError> {
    let mut depth = 0usize;
    let mut peak = 0usize;
    for tok in rpn {
        if tok.kind.is_operand() {
            depth += 1;
        } else {
            if depth < tok.argc {
                return Err(CompileError::MissingOperand {
                    op: tok.name(),
                    pos: tok.pos,
                });
            }
            if let Some(func) = tok.func {
                if !func.accepts(tok.argc) {
                    return Err(CompileError::Arity {
                        name: func.name,
                        got: tok.argc,
                        min: func.min,
                        max: func.max,
                    });
                }
            }
            depth = depth - tok.argc + 1;
        }
        peak = peak.max(depth);
    }
    if depth != 1 {
        return Err(CompileError::Malformed { operands: depth });
    }
    Ok(peak)
}

// ── CompiledExpr ──────────────────────────────────────────────────────────────

/// A validated RPN program, ready to evaluate any number of times.
///
/// Owns its instructions, a buffer holding every string literal and
/// identifier name (with quotes and escapes resolved), and the scratch arena
/// used while evaluating. See
/// [`evaluate`](CompiledExpr::evaluate) for the result lifetime.
#[derive(Debug)]
pub struct CompiledExpr {
    pub(crate) insns: Box<[Token]>,
    pub(crate) strings: String,
    pub(crate) depth: usize,
    pub(crate) scratch: Scratch,
}

impl CompiledExpr {
    /// Copy the program out of the parser's buffers, re-pointing every
    /// literal and identifier span at the owned string buffer.
    fn assemble(src: &str, rpn: Vec<Token>, depth: usize) -> Self {
        let total: usize = rpn
            .iter()
            .filter_map(|t| match t.payload {
                Payload::Span(span) => Some(span.len),
                _ => None,
            })
            .sum();
        let mut strings = String::with_capacity(total);

        let insns = rpn
            .into_iter()
            .map(|mut tok| {
                if let Payload::Span(span) = tok.payload {
                    let start = strings.len();
                    materialize(&mut strings, span.text(src));
                    tok.payload = Payload::Span(Span {
                        start,
                        len: strings.len() - start,
                    });
                }
                tok
            })
            .collect();

        CompiledExpr {
            insns,
            strings,
            depth,
            scratch: Scratch::new(),
        }
    }

    /// The RPN program.
    pub fn instructions(&self) -> &[Token] {
        &self.insns
    }

    /// Resolved text of a string or identifier instruction.
    pub fn text(&self, tok: &Token) -> Option<&str> {
        match tok.payload {
            Payload::Span(span) => self.strings.get(span.start..span.start + span.len),
            _ => None,
        }
    }

    /// Deepest operand stack any evaluation will need.
    pub fn max_depth(&self) -> usize {
        self.depth
    }

    pub fn scratch_stats(&self) -> ScratchStats {
        self.scratch.stats()
    }
}

/// Space-separated RPN listing, e.g. `2 3 4 * +`.
impl fmt::Display for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tok) in self.insns.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match (tok.kind, tok.payload) {
                (TokenKind::Num, Payload::Num(n)) => write!(f, "{n}")?,
                (TokenKind::Str, _) => {
                    let text = self.text(tok).unwrap_or_default();
                    write!(f, "\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))?
                }
                (TokenKind::Ident, _) => f.write_str(self.text(tok).unwrap_or_default())?,
                (TokenKind::Func, _) => write!(f, "{}/{}", tok.name(), tok.argc)?,
                _ => f.write_str(tok.name())?,
            }
        }
        Ok(())
    }
}

/// Append the value of a scanned literal to `buf`.
///
/// `"..."` drops the quotes and backslash escapes; `'...'` drops only the
/// quotes; identifiers are copied as is.
fn materialize(buf: &mut String, raw: &str) {
    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => buf.extend(chars.next()),
                c => buf.push(c),
            }
        }
    } else if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        buf.push_str(inner);
    } else {
        buf.push_str(raw);
    }
}

/// Compile `src` against the standard built-ins.
pub fn compile(src: &str) -> Result<CompiledExpr, CompileError> {
    Compiler::new(&Registry::standard()).compile(src)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
