//! Sandboxed arithmetic expressions for runtime-defined shapes.
//!
//! Coordinate expressions arrive as untrusted text. They are tokenized and
//! parsed into an [`Expr`] tree, then interpreted against a fixed set of
//! [`Bindings`]. Nothing outside the bound variables and the math function
//! table is reachable, and evaluation never panics.
//!
//! # Grammar
//!
//! ```text
//! ternary    := or ( "?" ternary ":" ternary )?
//! or         := and ( "||" and )*
//! and        := equality ( "&&" equality )*
//! equality   := comparison ( ("==" | "!=" ) comparison )*
//! comparison := additive ( ("<" | "<=" | ">" | ">=") additive )*
//! additive   := term ( ("+" | "-") term )*
//! term       := unary ( ("*" | "/" | "%") unary )*
//! unary      := ("-" | "+" | "!") unary | power
//! power      := primary ( ("**" | "^") unary )?
//! primary    := number | name | name "(" args ")" | "(" ternary ")"
//! ```
//!
//! Names may carry a `Math.` prefix (`Math.sin`, `Math.PI`). `===` and `!==`
//! are accepted as aliases of `==` and `!=`.
//!
//! # Variables
//!
//! - `i` - slot index
//! - `total` - slot count
//! - `u` - `i / total`
//! - `v` - per-slot pseudo-random value in `[0, 1)`

use crate::error::{ExprError, ExprResult};

/// Longest accepted expression source, in bytes.
pub const MAX_EXPR_LEN: usize = 4096;

/// Deepest accepted nesting of parentheses, unary operators and ternaries.
pub const MAX_DEPTH: usize = 64;

/// Values an expression can read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bindings {
    pub i: f64,
    pub total: f64,
    pub u: f64,
    pub v: f64,
}

/// A bound variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    I,
    Total,
    U,
    V,
}

impl Var {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "i" => Some(Var::I),
            "total" => Some(Var::Total),
            "u" => Some(Var::U),
            "v" => Some(Var::V),
            _ => None,
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    use std::f64::consts;
    match name {
        "PI" => Some(consts::PI),
        "E" => Some(consts::E),
        "TAU" => Some(consts::TAU),
        "LN2" => Some(consts::LN_2),
        "LN10" => Some(consts::LN_10),
        "LOG2E" => Some(consts::LOG2_E),
        "LOG10E" => Some(consts::LOG10_E),
        "SQRT2" => Some(consts::SQRT_2),
        "SQRT1_2" => Some(consts::FRAC_1_SQRT_2),
        _ => None,
    }
}

/// Functions callable from an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Sqrt,
    Cbrt,
    Exp,
    Expm1,
    Ln,
    Log1p,
    Log2,
    Log10,
    Abs,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sign,
    Fract,
    Min,
    Max,
    Pow,
    Hypot,
    Clamp,
}

enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        let f = match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "atan2" => Func::Atan2,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "asinh" => Func::Asinh,
            "acosh" => Func::Acosh,
            "atanh" => Func::Atanh,
            "sqrt" => Func::Sqrt,
            "cbrt" => Func::Cbrt,
            "exp" => Func::Exp,
            "expm1" => Func::Expm1,
            "ln" | "log" => Func::Ln,
            "log1p" => Func::Log1p,
            "log2" => Func::Log2,
            "log10" => Func::Log10,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "trunc" => Func::Trunc,
            "sign" => Func::Sign,
            "fract" => Func::Fract,
            "min" => Func::Min,
            "max" => Func::Max,
            "pow" => Func::Pow,
            "hypot" => Func::Hypot,
            "clamp" => Func::Clamp,
            _ => return None,
        };
        Some(f)
    }

    fn arity(self) -> Arity {
        match self {
            Func::Atan2 | Func::Pow => Arity::Exact(2),
            Func::Clamp => Arity::Exact(3),
            Func::Min | Func::Max | Func::Hypot => Arity::AtLeast(1),
            _ => Arity::Exact(1),
        }
    }

    fn check_arity(self, name: &str, got: usize) -> ExprResult<()> {
        let ok = match self.arity() {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
        };
        if ok {
            return Ok(());
        }
        let expected = match self.arity() {
            Arity::Exact(n) | Arity::AtLeast(n) => n,
        };
        Err(ExprError::Arity {
            name: name.to_string(),
            expected,
            got,
        })
    }

    /// Apply to already-evaluated arguments. Arity was checked at parse time.
    fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        let b = args.get(1).copied().unwrap_or(f64::NAN);
        match self {
            Func::Sin => a.sin(),
            Func::Cos => a.cos(),
            Func::Tan => a.tan(),
            Func::Asin => a.asin(),
            Func::Acos => a.acos(),
            Func::Atan => a.atan(),
            Func::Atan2 => a.atan2(b),
            Func::Sinh => a.sinh(),
            Func::Cosh => a.cosh(),
            Func::Tanh => a.tanh(),
            Func::Asinh => a.asinh(),
            Func::Acosh => a.acosh(),
            Func::Atanh => a.atanh(),
            Func::Sqrt => a.sqrt(),
            Func::Cbrt => a.cbrt(),
            Func::Exp => a.exp(),
            Func::Expm1 => a.exp_m1(),
            Func::Ln => a.ln(),
            Func::Log1p => a.ln_1p(),
            Func::Log2 => a.log2(),
            Func::Log10 => a.log10(),
            Func::Abs => a.abs(),
            Func::Floor => a.floor(),
            Func::Ceil => a.ceil(),
            // Halves round toward +inf.
            Func::Round => (a + 0.5).floor(),
            Func::Trunc => a.trunc(),
            Func::Sign => {
                if a > 0.0 {
                    1.0
                } else if a < 0.0 {
                    -1.0
                } else {
                    a
                }
            }
            Func::Fract => a - a.floor(),
            Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Func::Pow => a.powf(b),
            Func::Hypot => args.iter().map(|x| x * x).sum::<f64>().sqrt(),
            // min/max instead of f64::clamp, which panics on inverted bounds.
            Func::Clamp => {
                let hi = args.get(2).copied().unwrap_or(f64::NAN);
                a.max(b).min(hi)
            }
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(Var),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[inline]
fn truthy(x: f64) -> bool {
    x != 0.0 && !x.is_nan()
}

#[inline]
fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    /// Parse expression source.
    pub fn parse(src: &str) -> ExprResult<Expr> {
        if src.len() > MAX_EXPR_LEN {
            return Err(ExprError::TooLong {
                len: src.len(),
                limit: MAX_EXPR_LEN,
            });
        }
        let tokens = tokenize(src)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.ternary()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(ExprError::UnexpectedToken {
                found: tok.kind.describe(),
                expected: "end of expression",
                offset: tok.offset,
            }),
        }
    }

    /// Evaluate with the given bindings. May return NaN or infinity.
    pub fn eval(&self, b: &Bindings) -> f64 {
        match self {
            Expr::Num(n) => *n,
            Expr::Var(Var::I) => b.i,
            Expr::Var(Var::Total) => b.total,
            Expr::Var(Var::U) => b.u,
            Expr::Var(Var::V) => b.v,
            Expr::Neg(e) => -e.eval(b),
            Expr::Not(e) => flag(!truthy(e.eval(b))),
            Expr::Binary(op, l, r) => {
                // Evaluation is pure, so `&&`/`||` need not short-circuit.
                let (lv, rv) = (l.eval(b), r.eval(b));
                match op {
                    BinOp::Add => lv + rv,
                    BinOp::Sub => lv - rv,
                    BinOp::Mul => lv * rv,
                    BinOp::Div => lv / rv,
                    BinOp::Rem => lv % rv,
                    BinOp::Pow => lv.powf(rv),
                    BinOp::Lt => flag(lv < rv),
                    BinOp::Le => flag(lv <= rv),
                    BinOp::Gt => flag(lv > rv),
                    BinOp::Ge => flag(lv >= rv),
                    BinOp::Eq => flag(lv == rv),
                    BinOp::Ne => flag(lv != rv),
                    BinOp::And => {
                        if truthy(lv) {
                            rv
                        } else {
                            lv
                        }
                    }
                    BinOp::Or => {
                        if truthy(lv) {
                            lv
                        } else {
                            rv
                        }
                    }
                }
            }
            Expr::Call(func, args) => {
                let values: Vec<f64> = args.iter().map(|a| a.eval(b)).collect();
                func.apply(&values)
            }
            Expr::Cond(c, t, e) => {
                if truthy(c.eval(b)) {
                    t.eval(b)
                } else {
                    e.eval(b)
                }
            }
        }
    }
}

// ========== Tokenizer ==========

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Bang,
    AndAnd,
    OrOr,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Num(n) => format!("number {n}"),
            TokenKind::Ident(name) => format!("'{name}'"),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Bang => "!",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Num(_) | TokenKind::Ident(_) => "",
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(src: &str) -> ExprResult<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            pos = scan_number(bytes, pos);
            let text = &src[start..pos];
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::InvalidNumber(text.to_string()))?;
            tokens.push(Token {
                kind: TokenKind::Num(value),
                offset: start,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            pos = scan_ident(bytes, pos);
            let name = &src[start..pos];
            let name = name.strip_prefix("Math.").unwrap_or(name);
            tokens.push(Token {
                kind: TokenKind::Ident(name.to_string()),
                offset: start,
            });
            continue;
        }

        let next = bytes.get(pos + 1).copied();
        let next2 = bytes.get(pos + 2).copied();
        let (kind, len) = match (c, next) {
            (b'*', Some(b'*')) => (TokenKind::StarStar, 2),
            (b'<', Some(b'=')) => (TokenKind::Le, 2),
            (b'>', Some(b'=')) => (TokenKind::Ge, 2),
            (b'=', Some(b'=')) => (TokenKind::EqEq, if next2 == Some(b'=') { 3 } else { 2 }),
            (b'!', Some(b'=')) => (TokenKind::NotEq, if next2 == Some(b'=') { 3 } else { 2 }),
            (b'&', Some(b'&')) => (TokenKind::AndAnd, 2),
            (b'|', Some(b'|')) => (TokenKind::OrOr, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'^', _) => (TokenKind::Caret, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b'?', _) => (TokenKind::Question, 1),
            (b':', _) => (TokenKind::Colon, 1),
            (b'<', _) => (TokenKind::Lt, 1),
            (b'>', _) => (TokenKind::Gt, 1),
            (b'!', _) => (TokenKind::Bang, 1),
            _ => {
                let ch = src[pos..].chars().next().unwrap_or('\u{fffd}');
                return Err(ExprError::UnexpectedChar { ch, offset: pos });
            }
        };
        tokens.push(Token { kind, offset: start });
        pos += len;
    }

    Ok(tokens)
}

fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
        pos += 1;
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut look = pos + 1;
        if look < bytes.len() && (bytes[look] == b'+' || bytes[look] == b'-') {
            look += 1;
        }
        if look < bytes.len() && bytes[look].is_ascii_digit() {
            pos = look;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }
    pos
}

fn scan_ident(bytes: &[u8], mut pos: usize) -> usize {
    let word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    while pos < bytes.len() && word(bytes[pos]) {
        pos += 1;
    }
    // Dotted paths such as `Math.sin`.
    while pos + 1 < bytes.len()
        && bytes[pos] == b'.'
        && (bytes[pos + 1].is_ascii_alphabetic() || bytes[pos + 1] == b'_')
    {
        pos += 1;
        while pos < bytes.len() && word(bytes[pos]) {
            pos += 1;
        }
    }
    pos
}

// ========== Parser ==========

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> ExprResult<()> {
        match self.advance() {
            Some(tok) if tok.kind == kind => Ok(()),
            Some(tok) => Err(ExprError::UnexpectedToken {
                found: tok.kind.describe(),
                expected,
                offset: tok.offset,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn enter(&mut self) -> ExprResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(ExprError::TooDeep(MAX_DEPTH))
        } else {
            Ok(())
        }
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn ternary(&mut self) -> ExprResult<Expr> {
        self.enter()?;
        let cond = self.or()?;
        let expr = if self.eat(&TokenKind::Question) {
            let then = self.ternary()?;
            self.expect(TokenKind::Colon, "':'")?;
            let otherwise = self.ternary()?;
            Expr::Cond(Box::new(cond), Box::new(then), Box::new(otherwise))
        } else {
            cond
        };
        self.leave();
        Ok(expr)
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> ExprResult<Expr>,
        ops: &[(TokenKind, BinOp)],
    ) -> ExprResult<Expr> {
        let mut lhs = next(self)?;
        'outer: loop {
            for (kind, op) in ops {
                if self.eat(kind) {
                    let rhs = next(self)?;
                    lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn or(&mut self) -> ExprResult<Expr> {
        self.binary_level(Self::and, &[(TokenKind::OrOr, BinOp::Or)])
    }

    fn and(&mut self) -> ExprResult<Expr> {
        self.binary_level(Self::equality, &[(TokenKind::AndAnd, BinOp::And)])
    }

    fn equality(&mut self) -> ExprResult<Expr> {
        self.binary_level(
            Self::comparison,
            &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::NotEq, BinOp::Ne)],
        )
    }

    fn comparison(&mut self) -> ExprResult<Expr> {
        self.binary_level(
            Self::additive,
            &[
                (TokenKind::Le, BinOp::Le),
                (TokenKind::Ge, BinOp::Ge),
                (TokenKind::Lt, BinOp::Lt),
                (TokenKind::Gt, BinOp::Gt),
            ],
        )
    }

    fn additive(&mut self) -> ExprResult<Expr> {
        self.binary_level(
            Self::term,
            &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
        )
    }

    fn term(&mut self) -> ExprResult<Expr> {
        self.binary_level(
            Self::unary,
            &[
                (TokenKind::Star, BinOp::Mul),
                (TokenKind::Slash, BinOp::Div),
                (TokenKind::Percent, BinOp::Rem),
            ],
        )
    }

    fn unary(&mut self) -> ExprResult<Expr> {
        self.enter()?;
        let expr = if self.eat(&TokenKind::Minus) {
            Expr::Neg(Box::new(self.unary()?))
        } else if self.eat(&TokenKind::Plus) {
            self.unary()?
        } else if self.eat(&TokenKind::Bang) {
            Expr::Not(Box::new(self.unary()?))
        } else {
            self.power()?
        };
        self.leave();
        Ok(expr)
    }

    fn power(&mut self) -> ExprResult<Expr> {
        let base = self.primary()?;
        if self.eat(&TokenKind::StarStar) || self.eat(&TokenKind::Caret) {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> ExprResult<Expr> {
        let tok = self.advance().ok_or(ExprError::UnexpectedEnd)?;
        match tok.kind {
            TokenKind::Num(n) => Ok(Expr::Num(n)),
            TokenKind::LParen => {
                let inner = self.ternary()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    self.call(name)
                } else if let Some(var) = Var::lookup(&name) {
                    Ok(Expr::Var(var))
                } else if let Some(value) = constant(&name) {
                    Ok(Expr::Num(value))
                } else {
                    Err(ExprError::UnknownVariable(name))
                }
            }
            other => Err(ExprError::UnexpectedToken {
                found: other.describe(),
                expected: "a number, name or '('",
                offset: tok.offset,
            }),
        }
    }

    fn call(&mut self, name: String) -> ExprResult<Expr> {
        let func = Func::lookup(&name).ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;
        let mut args = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                args.push(self.ternary()?);
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }
        func.check_arity(&name, args.len())?;
        Ok(Expr::Call(func, args))
    }
}
