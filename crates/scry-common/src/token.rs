use serde::Serialize;

use crate::span::Span;

/// A token produced by the scry lexer.
///
/// Tokens own their text: the suggestion engine hands token lists to a
/// worker thread, so borrowing from the input line is not an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind, its raw text, and byte offsets.
    pub fn new(kind: TokenKind, text: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            span: Span::new(start, end),
        }
    }

    /// Whether this token lexes as a literal (string, char, or a numeric
    /// identifier-shaped token starting with a digit or `-digit`).
    pub fn is_literal_shaped(&self) -> bool {
        match self.kind {
            TokenKind::Str | TokenKind::Char => true,
            TokenKind::Ident => {
                let mut chars = self.text.chars();
                match chars.next() {
                    Some(c) if c.is_ascii_digit() => true,
                    Some('-') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
                    Some('.') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Whether this token is a `$`-prefixed variable reference.
    pub fn is_variable(&self) -> bool {
        self.kind == TokenKind::Ident && self.text.starts_with('$')
    }
}

/// Every kind of token in the scry command language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Identifier segment. Also covers numeric literals and `$`-variables,
    /// which are identifier-shaped at the lexical level.
    Ident,
    /// String literal (`"..."`), text stored with escapes resolved.
    Str,
    /// Char literal (`'x'`), text stored with the escape resolved.
    Char,
    /// `.` dereference operator (not part of a float literal).
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;` (one implicit `;` is appended at end of input).
    Semicolon,
    /// `=`
    Eq,
    /// Invalid input. Emitted for error recovery so that token boundaries
    /// survive malformed input.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_shapes() {
        assert!(Token::new(TokenKind::Ident, "5", 0, 1).is_literal_shaped());
        assert!(Token::new(TokenKind::Ident, "-5", 0, 2).is_literal_shaped());
        assert!(Token::new(TokenKind::Ident, "3.14", 0, 4).is_literal_shaped());
        assert!(Token::new(TokenKind::Ident, ".5", 0, 2).is_literal_shaped());
        assert!(Token::new(TokenKind::Str, "hi", 0, 4).is_literal_shaped());
        assert!(!Token::new(TokenKind::Ident, "foo", 0, 3).is_literal_shaped());
        assert!(!Token::new(TokenKind::Ident, "$a", 0, 2).is_literal_shaped());
    }

    #[test]
    fn variable_shape() {
        assert!(Token::new(TokenKind::Ident, "$a", 0, 2).is_variable());
        assert!(!Token::new(TokenKind::Ident, "a", 0, 1).is_variable());
    }
}
