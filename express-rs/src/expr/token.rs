//! Tokens, the operator precedence table, and the token scanner.
//!
//! The scanner is context sensitive in exactly one place: a `+` or `-` that
//! cannot be a binary operator (because the previous token did not end an
//! operand) is folded into the number that follows it. That is what makes
//! `3 + -2` and `a - 2` both come out right.

use super::builtins::{Builtin, Registry};
use super::value::scan_number;
use crate::error::CompileError;

// ── TokenKind ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `(`
    Open,
    /// `)`
    Close,
    Num,
    Ident,
    Str,
    Func,
    /// `!`
    Not,
    /// `~`
    BitNot,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    /// `~=`
    Match,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    /// `,`
    Sep,
}

impl TokenKind {
    /// Binding strength; higher binds tighter.
    ///
    /// Grouping tokens, separators and operands sit at `-1` so an incoming
    /// operator never pops them.
    pub fn level(self) -> i8 {
        use TokenKind::*;
        match self {
            Open | Close | Num | Ident | Str | Sep => -1,
            Func => 127,
            Not | BitNot => 126,
            Mul | Div | Mod => 125,
            Add | Sub => 124,
            Shl | Shr => 123,
            Lt | Le | Gt | Ge => 122,
            Eq | Ne | Match => 121,
            BitAnd => 120,
            BitXor => 119,
            BitOr => 118,
            And => 117,
            Or => 116,
        }
    }

    /// Every binary level is left-associative; the unary prefix operators
    /// never pop a peer of equal level, so `!!x` nests.
    pub fn is_left_assoc(self) -> bool {
        !matches!(self, TokenKind::Not | TokenKind::BitNot)
    }

    /// Operands consumed by an operator. Function calls start at zero and
    /// are counted while compiling.
    pub fn arity(self) -> usize {
        use TokenKind::*;
        match self {
            Not | BitNot => 1,
            Open | Close | Num | Ident | Str | Func | Sep => 0,
            _ => 2,
        }
    }

    /// Number, string and identifier tokens push a value.
    pub fn is_operand(self) -> bool {
        matches!(self, TokenKind::Num | TokenKind::Ident | TokenKind::Str)
    }

    /// Unary and binary operators, i.e. the tokens that participate in
    /// precedence popping.
    pub fn is_operator(self) -> bool {
        self.level() >= 0 && self != TokenKind::Func
    }

    /// True if a `+`/`-` following this token must be binary.
    fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Close | TokenKind::Num | TokenKind::Ident | TokenKind::Str
        )
    }

    pub fn symbol(self) -> &'static str {
        use TokenKind::*;
        match self {
            Open => "(",
            Close => ")",
            Num => "number",
            Ident => "identifier",
            Str => "string",
            Func => "function",
            Not => "!",
            BitNot => "~",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Add => "+",
            Sub => "-",
            Shl => "<<",
            Shr => ">>",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Eq => "==",
            Ne => "!=",
            Match => "~=",
            BitAnd => "&",
            BitXor => "^",
            BitOr => "|",
            And => "&&",
            Or => "||",
            Sep => ",",
        }
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

/// A byte range: into the source while compiling, into the compiled string
/// buffer afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn text(self, buf: &str) -> &str {
        &buf[self.start..self.start + self.len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    None,
    Num(f64),
    Span(Span),
}

/// One lexical token, and (after compilation) one RPN instruction.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    /// Operands consumed; the resolved argument count for a call.
    pub argc: usize,
    /// The resolved built-in, for [`TokenKind::Func`].
    pub func: Option<&'static Builtin>,
    pub payload: Payload,
    /// Byte offset in the source.
    pub pos: usize,
}

impl Token {
    pub fn operator(kind: TokenKind, pos: usize) -> Self {
        Token {
            kind,
            argc: kind.arity(),
            func: None,
            payload: Payload::None,
            pos,
        }
    }

    pub fn number(value: f64, pos: usize) -> Self {
        Token {
            payload: Payload::Num(value),
            ..Token::operator(TokenKind::Num, pos)
        }
    }

    pub fn text(kind: TokenKind, span: Span) -> Self {
        Token {
            payload: Payload::Span(span),
            ..Token::operator(kind, span.start)
        }
    }

    pub fn call(func: &'static Builtin, pos: usize) -> Self {
        Token {
            func: Some(func),
            ..Token::operator(TokenKind::Func, pos)
        }
    }

    /// Operator symbol or function name, for diagnostics and listings.
    pub fn name(&self) -> &'static str {
        self.func.map_or(self.kind.symbol(), |f| f.name)
    }
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

/// Scans an expression into [`Token`]s, resolving function names against a
/// [`Registry`] as it goes.
pub struct Lexer<'s, 'r> {
    src: &'s str,
    pos: usize,
    prev: Option<TokenKind>,
    registry: &'r Registry,
}

impl<'s, 'r> Lexer<'s, 'r> {
    pub fn new(src: &'s str, registry: &'r Registry) -> Self {
        Lexer {
            src,
            pos: 0,
            prev: None,
            registry,
        }
    }

    /// Kind of the most recently scanned token.
    pub fn prev(&self) -> Option<TokenKind> {
        self.prev
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos + 1).copied()
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace() || c == b'\x0b') {
            self.pos += 1;
        }
    }

    fn op(&mut self, kind: TokenKind, len: usize) -> Token {
        let tok = Token::operator(kind, self.pos);
        self.pos += len;
        tok
    }

    /// `op2` if the next byte is `second`, otherwise the one-byte `op1`.
    fn op_pair(&mut self, second: u8, op2: TokenKind, op1: TokenKind) -> Token {
        if self.peek2() == Some(second) {
            self.op(op2, 2)
        } else {
            self.op(op1, 1)
        }
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let start = self.pos;
        let (value, len) =
            scan_number(&self.src[start..]).ok_or(CompileError::InvalidNumber { pos: start })?;
        self.pos += len;
        Ok(Token::number(value, start))
    }

    /// Scan a quoted literal; the token spans both quotes. Escapes are
    /// resolved later, when the literal is copied into the compiled buffer.
    fn read_string(&mut self, quote: u8) -> Result<Token, CompileError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        loop {
            match bytes.get(i) {
                None => return Err(CompileError::UnterminatedString { pos: start }),
                Some(&b'\\') if quote == b'"' && i + 1 < bytes.len() => i += 2,
                Some(&c) if c == quote => break,
                Some(_) => i += 1,
            }
        }
        self.pos = i + 1;
        Ok(Token::text(
            TokenKind::Str,
            Span {
                start,
                len: self.pos - start,
            },
        ))
    }

    /// Identifier or function name. A name followed by `(` (blanks allowed
    /// in between) is a call and must name a built-in.
    fn read_ident(&mut self) -> Result<Token, CompileError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'$' | b'.'))
        {
            self.pos += 1;
        }
        let name = &self.src[start..self.pos];
        self.skip_blank();

        if self.peek() == Some(b'(') {
            let func = self
                .registry
                .get(name)
                .ok_or_else(|| CompileError::UnknownFunction {
                    name: name.to_owned(),
                    pos: start,
                })?;
            Ok(Token::call(func, start))
        } else {
            Ok(Token::text(
                TokenKind::Ident,
                Span {
                    start,
                    len: name.len(),
                },
            ))
        }
    }

    /// Scan the next token, or `Ok(None)` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        use TokenKind::*;

        self.skip_blank();
        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        let sign_is_binary = self.prev.is_some_and(TokenKind::ends_operand);

        let tok = match ch {
            b'(' => self.op(Open, 1),
            b')' => self.op(Close, 1),
            b',' => self.op(Sep, 1),
            b'*' => self.op(Mul, 1),
            b'/' => self.op(Div, 1),
            b'%' => self.op(Mod, 1),
            b'^' => self.op(BitXor, 1),
            b'+' if sign_is_binary => self.op(Add, 1),
            b'-' if sign_is_binary => self.op(Sub, 1),
            b'+' | b'-' | b'0'..=b'9' => self.read_number()?,
            b'\'' | b'"' => self.read_string(ch)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => self.read_ident()?,
            b'=' if self.peek2() == Some(b'=') => self.op(Eq, 2),
            b'<' if self.peek2() == Some(b'<') => self.op(Shl, 2),
            b'<' => self.op_pair(b'=', Le, Lt),
            b'>' if self.peek2() == Some(b'>') => self.op(Shr, 2),
            b'>' => self.op_pair(b'=', Ge, Gt),
            b'&' => self.op_pair(b'&', And, BitAnd),
            b'|' => self.op_pair(b'|', Or, BitOr),
            b'!' => self.op_pair(b'=', Ne, Not),
            b'~' => self.op_pair(b'=', Match, BitNot),
            _ => {
                return Err(CompileError::UnexpectedChar {
                    ch: self.src[self.pos..].chars().next().unwrap_or_default(),
                    pos: self.pos,
                })
            }
        };

        self.prev = Some(tok.kind);
        Ok(Some(tok))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let registry = Registry::standard();
        let mut lexer = Lexer::new(src, &registry);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token().expect("lex failed") {
            out.push(tok.kind);
        }
        out
    }

    fn lex_err(src: &str) -> CompileError {
        let registry = Registry::standard();
        let mut lexer = Lexer::new(src, &registry);
        loop {
            match lexer.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a lex error for {src:?}"),
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn two_char_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("a == b != c <= d >= e << f >> g && h || i ~= j"),
            vec![Ident, Eq, Ident, Ne, Ident, Le, Ident, Ge, Ident, Shl, Ident, Shr, Ident, And,
                 Ident, Or, Ident, Match, Ident]
        );
    }

    #[test]
    fn one_char_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("!a ~b * / % < > & ^ |"),
            vec![Not, Ident, BitNot, Ident, Mul, Div, Mod, Lt, Gt, BitAnd, BitXor, BitOr]
        );
    }

    #[test]
    fn bare_equals_is_rejected() {
        assert_eq!(lex_err("a = 1"), CompileError::UnexpectedChar { ch: '=', pos: 2 });
    }

    #[test]
    fn sign_folds_after_operator() {
        use TokenKind::*;
        assert_eq!(kinds("3 + -2"), vec![Num, Add, Num]);
        assert_eq!(kinds("-3 * -2"), vec![Num, Mul, Num]);
        assert_eq!(kinds("(-1)"), vec![Open, Num, Close]);
    }

    #[test]
    fn sign_is_binary_after_operand() {
        use TokenKind::*;
        assert_eq!(kinds("3 - 2"), vec![Num, Sub, Num]);
        assert_eq!(kinds("3-2"), vec![Num, Sub, Num]);
        assert_eq!(kinds("a - 2"), vec![Ident, Sub, Num]);
        assert_eq!(kinds("(1) + 2"), vec![Open, Num, Close, Add, Num]);
        assert_eq!(kinds("'5' + 3"), vec![Str, Add, Num]);
    }

    #[test]
    fn folded_sign_value() {
        let registry = Registry::standard();
        let mut lexer = Lexer::new("1 - -2.5", &registry);
        let toks: Vec<Token> = std::iter::from_fn(|| lexer.next_token().unwrap()).collect();
        assert_eq!(toks[2].payload, Payload::Num(-2.5));
        assert_eq!(toks[2].pos, 4);
    }

    #[test]
    fn detached_sign_is_invalid() {
        assert_eq!(lex_err("2 * - 3"), CompileError::InvalidNumber { pos: 4 });
    }

    #[test]
    fn function_call_with_blanks_before_paren() {
        use TokenKind::*;
        assert_eq!(kinds("strlen  ('x')"), vec![Func, Open, Str, Close]);
    }

    #[test]
    fn unknown_function() {
        assert_eq!(
            lex_err("1 + nope(2)"),
            CompileError::UnknownFunction {
                name: "nope".into(),
                pos: 4
            }
        );
    }

    #[test]
    fn identifier_charset() {
        let registry = Registry::standard();
        let mut lexer = Lexer::new("$user.name_2 x", &registry);
        let tok = lexer.next_token().unwrap().unwrap();
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.payload, Payload::Span(Span { start: 0, len: 12 }));
    }

    #[test]
    fn string_spans_include_quotes() {
        let registry = Registry::standard();
        let src = r#""a\"b" 'c\'"#;
        let mut lexer = Lexer::new(src, &registry);
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.payload, Payload::Span(Span { start: 0, len: 6 }));
        let second = lexer.next_token().unwrap().unwrap();
        // No escapes inside single quotes: the backslash is literal.
        assert_eq!(second.payload, Payload::Span(Span { start: 7, len: 4 }));
    }

    #[test]
    fn unterminated_strings() {
        assert_eq!(lex_err("'abc"), CompileError::UnterminatedString { pos: 0 });
        assert_eq!(lex_err(r#"x == "ab\""#), CompileError::UnterminatedString { pos: 5 });
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(lex_err("1 # 2"), CompileError::UnexpectedChar { ch: '#', pos: 2 });
        assert_eq!(lex_err("1 + é"), CompileError::UnexpectedChar { ch: 'é', pos: 4 });
    }

    #[test]
    fn precedence_levels_are_ordered() {
        use TokenKind::*;
        let order = [Or, And, BitOr, BitXor, BitAnd, Eq, Lt, Shl, Add, Mul, Not, Func];
        for pair in order.windows(2) {
            assert!(pair[0].level() < pair[1].level(), "{:?} !< {:?}", pair[0], pair[1]);
        }
        assert_eq!(Ne.level(), Match.level());
        assert!(!Not.is_left_assoc());
        assert!(Sub.is_left_assoc());
    }
}
