//! Recursive descent parser for calculator statements
//!
//! ```text
//! program   := (statement? SEP)* EOF
//! statement := IDENT '=' expr | expr
//! expr      := term (('+' | '-') term)*
//! term      := unary (('*' | '/' | '%') unary)*
//! unary     := '-' unary | primary
//! primary   := INT | IDENT | IDENT '(' args ')' | '(' expr ')'
//! ```
//!
//! Nesting and operator chains both deepen the tree that evaluation walks
//! recursively, so together they are capped at [`MAX_DEPTH`].

use super::lexer::{Token, TokenKind};
use super::CalcError;
use crate::eval::SourceSpan;

/// Deepest expression tree the parser will build
pub const MAX_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64, SourceSpan),
    Var(String, SourceSpan),
    Neg(Box<Expr>, SourceSpan),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: SourceSpan,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        name_span: SourceSpan,
        span: SourceSpan,
    },
}

impl Expr {
    pub fn span(&self) -> SourceSpan {
        match self {
            Expr::Int(_, span) | Expr::Var(_, span) | Expr::Neg(_, span) => *span,
            Expr::Binary { span, .. } | Expr::Call { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assign { name: String, value: Expr },
    Expr(Expr),
}

impl Stmt {
    /// Span of the value; a statement never crosses a line
    pub fn span(&self) -> SourceSpan {
        match self {
            Stmt::Assign { value, .. } => value.span(),
            Stmt::Expr(expr) => expr.span(),
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Height of the tree above the expression being parsed
    depth: usize,
}

impl Parser {
    /// `tokens` must end with [`TokenKind::Eof`], as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, CalcError> {
        let mut statements = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Separator => {
                    self.advance();
                }
                _ => {
                    statements.push(self.parse_statement()?);
                    match self.peek_kind() {
                        TokenKind::Separator | TokenKind::Eof => {}
                        other => {
                            return Err(CalcError::new(
                                format!("unexpected token '{}'", other),
                                self.peek().span,
                            ))
                        }
                    }
                }
            }
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, CalcError> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            if self.peek_kind_at(1) == &TokenKind::Eq {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                return Ok(Stmt::Assign { name, value });
            }
        }
        Ok(Stmt::Expr(self.parse_expression()?))
    }

    fn parse_expression(&mut self) -> Result<Expr, CalcError> {
        let mut left = self.parse_term()?;
        let mut chained = 0;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let op_span = self.advance().span;
            self.descend(op_span)?;
            chained += 1;
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, CalcError> {
        let mut left = self.parse_unary()?;
        let mut chained = 0;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            let op_span = self.advance().span;
            self.descend(op_span)?;
            chained += 1;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CalcError> {
        if self.peek_kind() == &TokenKind::Minus {
            let minus = self.advance().span;
            self.descend(minus)?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            let span = minus.to(operand.span());
            return Ok(Expr::Neg(Box::new(operand), span));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, CalcError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(n) => Ok(Expr::Int(n, token.span)),
            TokenKind::Ident(name) => {
                if self.peek_kind() == &TokenKind::LParen {
                    self.parse_call(name, token.span)
                } else {
                    Ok(Expr::Var(name, token.span))
                }
            }
            TokenKind::LParen => {
                self.descend(token.span)?;
                let inner = self.parse_expression()?;
                self.depth -= 1;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(inner)
            }
            other => Err(unexpected(&other, token.span)),
        }
    }

    fn parse_call(&mut self, name: String, name_span: SourceSpan) -> Result<Expr, CalcError> {
        self.advance(); // (
        self.descend(name_span)?;
        let mut args = Vec::new();

        if self.peek_kind() != &TokenKind::RParen {
            loop {
                args.push(self.parse_expression()?);
                if self.peek_kind() == &TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.depth -= 1;
        let close = self.expect(TokenKind::RParen, "expected ')' after arguments")?;
        Ok(Expr::Call {
            name,
            args,
            name_span,
            span: name_span.to(close),
        })
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<SourceSpan, CalcError> {
        if self.peek_kind() == &kind {
            Ok(self.advance().span)
        } else {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof | TokenKind::Separator => Err(unexpected(&token.kind, token.span)),
                _ => Err(CalcError::new(message, token.span)),
            }
        }
    }

    /// Go one level deeper, failing at `span` past [`MAX_DEPTH`]
    fn descend(&mut self, span: SourceSpan) -> Result<(), CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::new("expression nested too deeply", span));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> &Token {
        // The lexer guarantees a trailing Eof, and advance never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

fn unexpected(kind: &TokenKind, span: SourceSpan) -> CalcError {
    match kind {
        TokenKind::Eof => CalcError::new("unexpected end of input", span),
        TokenKind::Separator => CalcError::new("unexpected end of line", span),
        other => CalcError::new(format!("unexpected token '{}'", other), span),
    }
}
