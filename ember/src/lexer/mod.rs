//! Lexer implementation using logos

mod token;

pub use token::{LexErrorKind, Token};

use crate::ast::{LineIndex, Position, Span};
use crate::error::{CompileError, Result};
use logos::Logos;

/// A token with its byte span and line/column position
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub span: Span,
    pub pos: Position,
}

impl Lexeme {
    /// The source text this token was read from
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        source.get(self.span.start..self.span.end).unwrap_or("")
    }
}

/// Tokenize source code; the result always ends with a single `Token::Eof`
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push(Lexeme {
                token,
                span,
                pos: index.position(span.start),
            }),
            Err(kind) => {
                let message = match kind {
                    LexErrorKind::UnexpectedChar => {
                        format!("unexpected character: {:?}", lexer.slice())
                    }
                    LexErrorKind::UnterminatedString => "unterminated string literal".to_string(),
                    LexErrorKind::InvalidEscape(seq) => format!("invalid escape sequence: {seq}"),
                    LexErrorKind::IntegerTooLarge => {
                        format!("integer literal out of range: {}", lexer.slice())
                    }
                };
                return Err(CompileError::lexer(message, span));
            }
        }
    }

    let end = Span::new(source.len(), source.len());
    tokens.push(Lexeme {
        token: Token::Eof,
        span: end,
        pos: index.position(end.start),
    });

    tracing::debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}
