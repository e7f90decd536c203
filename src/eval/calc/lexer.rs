//! Tokenizer for the calculator.
//!
//! Spans are character offsets into the source so they can be handed straight
//! back to the shell's margin annotation.

use super::CalcError;
use crate::eval::SourceSpan;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Int(i64),
    Ident(String),

    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Eq,      // =

    LParen, // (
    RParen, // )
    Comma,  // ,

    /// Statement separator: newline or `;`
    Separator,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{}", n),
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Separator => write!(f, "end of line"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CalcError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_blanks_and_comments();

            let start = self.position;
            let Some(ch) = self.advance() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: SourceSpan::point(start),
                });
                break;
            };

            let kind = match ch {
                '\n' | ';' => TokenKind::Separator,
                '0'..='9' => self.number_literal(start)?,
                'a'..='z' | 'A'..='Z' | '_' => self.identifier(ch),
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '=' => TokenKind::Eq,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ',' => TokenKind::Comma,
                other => {
                    return Err(CalcError::new(
                        format!("unexpected character '{}'", other),
                        SourceSpan::new(start, self.position),
                    ))
                }
            };

            tokens.push(Token {
                kind,
                span: SourceSpan::new(start, self.position),
            });
        }

        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Skip spaces, tabs, carriage returns and `#` comments (but not newlines)
    fn skip_blanks_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.position += 1;
                }
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.position += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn number_literal(&mut self, start: usize) -> Result<TokenKind, CalcError> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.position += 1;
        }

        let digits: String = self.input[start..self.position].iter().collect();
        digits.parse::<i64>().map(TokenKind::Int).map_err(|_| {
            CalcError::new(
                "integer literal too large",
                SourceSpan::new(start, self.position),
            )
        })
    }

    fn identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        TokenKind::Ident(name)
    }
}
