//! Token types for the material script lexer.

use std::sync::Arc;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub file: Arc<str>,
    pub line: u32,
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    Colon,
    /// `$name`, lexeme includes the `$`.
    Variable,
    Word,
    /// `"..."`, lexeme includes the quotes.
    Quote,
    Newline,
    Unknown,
    End,
}

impl Token {
    /// The lexeme with surrounding quotes removed, for `Quote` tokens.
    pub fn text(&self) -> &str {
        match self.kind {
            TokenKind::Quote => self
                .lexeme
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(&self.lexeme),
            _ => &self.lexeme,
        }
    }
}
