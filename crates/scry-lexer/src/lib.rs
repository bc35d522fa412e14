// scry-lexer -- tokenizer for the scry command language.
//
// One line of operator input becomes a flat token stream. The scan always
// runs to end of input: errors are recorded, never thrown mid-scan, so the
// suggestion engine can work with token boundaries from malformed lines.

mod cursor;

use cursor::Cursor;
use scry_common::error::{LexError, LexErrorKind};
use scry_common::span::Span;
use scry_common::token::{Token, TokenKind};

/// Result of tokenizing one command line.
///
/// `tokens` is complete even when `error` is set; `error` is the first
/// problem encountered in source order.
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub error: Option<LexError>,
}

/// Tokenize a full command line, appending the implicit trailing `;`.
pub fn tokenize(source: &str) -> LexOutput {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<Token> = (&mut lexer).collect();
    LexOutput {
        tokens,
        error: lexer.errors.into_iter().next(),
    }
}

/// The scry lexer. Converts command text into a stream of tokens.
///
/// Implements `Iterator<Item = Token>`; the final item is always the
/// implicit `;` appended at end of input.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Errors in source order. The pipeline reports only the first.
    errors: Vec<LexError>,
    emitted_trailing_semi: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
            emitted_trailing_semi: false,
        }
    }

    fn error(&mut self, kind: LexErrorKind, span: Span) {
        self.errors.push(LexError::new(kind, span));
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.cursor.peek(), Some(c) if c.is_whitespace()) {
            self.cursor.advance();
        }
    }

    /// Consume one character and return a token of the given kind.
    fn single_char_token(&mut self, kind: TokenKind, c: char, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, c.to_string(), start, self.cursor.pos())
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let start = self.cursor.pos();
        let c = match self.cursor.peek() {
            Some(c) => c,
            None => {
                // Implicit statement terminator at end of input.
                if self.emitted_trailing_semi {
                    return None;
                }
                self.emitted_trailing_semi = true;
                return Some(Token::new(TokenKind::Semicolon, ";", start, start));
            }
        };

        let token = match c {
            '(' => self.single_char_token(TokenKind::LParen, c, start),
            ')' => self.single_char_token(TokenKind::RParen, c, start),
            '[' => self.single_char_token(TokenKind::LBracket, c, start),
            ']' => self.single_char_token(TokenKind::RBracket, c, start),
            ',' => self.single_char_token(TokenKind::Comma, c, start),
            ';' => self.single_char_token(TokenKind::Semicolon, c, start),
            '=' => self.single_char_token(TokenKind::Eq, c, start),

            // `.digit` starts a float literal; a bare `.` is the
            // dereference operator.
            '.' => {
                if matches!(self.cursor.peek_next(), Some(d) if d.is_ascii_digit()) {
                    self.lex_ident(start)
                } else {
                    self.single_char_token(TokenKind::Dot, c, start)
                }
            }

            // Leading `-` is admitted only to start a negative numeric
            // literal.
            '-' => {
                if matches!(self.cursor.peek_next(), Some(d) if d.is_ascii_digit()) {
                    self.lex_ident(start)
                } else {
                    self.cursor.advance();
                    let span = Span::new(start, self.cursor.pos());
                    self.error(LexErrorKind::UnexpectedCharacter('-'), span);
                    Token::new(TokenKind::Error, "-", start, self.cursor.pos())
                }
            }

            '"' => self.lex_string(start),
            '\'' => self.lex_char(start),

            c if is_ident_char(c) => self.lex_ident(start),

            other => {
                self.cursor.advance();
                let span = Span::new(start, self.cursor.pos());
                self.error(LexErrorKind::UnexpectedCharacter(other), span);
                Token::new(TokenKind::Error, other.to_string(), start, self.cursor.pos())
            }
        };
        Some(token)
    }

    /// Identifier-shaped token: letters, digits, `_`, `$`, an admitted
    /// leading `-`, and `.` when the next character is a digit (so float
    /// literals like `3.14` stay one token).
    fn lex_ident(&mut self, start: u32) -> Token {
        let mut text = String::new();
        // An admitted leading `-` or `.` (checked by the caller).
        if matches!(self.cursor.peek(), Some('-') | Some('.')) {
            text.push(self.cursor.advance().unwrap());
        }
        while let Some(c) = self.cursor.peek() {
            if is_ident_char(c) {
                text.push(c);
                self.cursor.advance();
            } else if c == '.' && matches!(self.cursor.peek_next(), Some(d) if d.is_ascii_digit())
            {
                text.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Ident, text, start, self.cursor.pos())
    }

    /// Resolve one escape sequence after a consumed `\`.
    fn lex_escape(&mut self, text: &mut String) {
        let esc_start = self.cursor.pos() - 1;
        match self.cursor.advance() {
            Some('\\') => text.push('\\'),
            Some('"') => text.push('"'),
            Some('b') => text.push('\u{0008}'),
            Some('f') => text.push('\u{000C}'),
            Some('n') => text.push('\n'),
            Some('r') => text.push('\r'),
            Some('t') => text.push('\t'),
            Some(other) => {
                let span = Span::new(esc_start, self.cursor.pos());
                self.error(LexErrorKind::InvalidEscape(other), span);
                text.push(other);
            }
            None => {
                let span = Span::new(esc_start, self.cursor.pos());
                self.error(LexErrorKind::InvalidEscape('\0'), span);
            }
        }
    }

    /// `"..."` with escapes. Must close before end of input.
    fn lex_string(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.cursor.advance() {
                Some('"') => break,
                Some('\\') => self.lex_escape(&mut text),
                Some(c) => text.push(c),
                None => {
                    let span = Span::new(start, self.cursor.pos());
                    self.error(LexErrorKind::UnterminatedString, span);
                    break;
                }
            }
        }
        Token::new(TokenKind::Str, text, start, self.cursor.pos())
    }

    /// `'x'` with the same escapes as strings.
    fn lex_char(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening quote
        let mut text = String::new();
        let mut closed = false;
        loop {
            match self.cursor.advance() {
                Some('\'') => {
                    closed = true;
                    break;
                }
                Some('\\') => self.lex_escape(&mut text),
                Some(c) => text.push(c),
                None => {
                    let span = Span::new(start, self.cursor.pos());
                    self.error(LexErrorKind::UnterminatedChar, span);
                    break;
                }
            }
        }
        if closed && text.chars().count() != 1 {
            let span = Span::new(start, self.cursor.pos());
            self.error(LexErrorKind::InvalidCharLiteral, span);
        }
        Token::new(TokenKind::Char, text, start, self.cursor.pos())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Characters admitted anywhere in an identifier: letters, digits, `_`, `$`.
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source).tokens.iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn member_chain_with_call() {
        assert_eq!(
            kinds("Foo.Bar(1, 2)"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn float_literal_keeps_dot() {
        assert_eq!(texts("3.14"), vec!["3.14", ";"]);
        assert_eq!(texts(".5"), vec![".5", ";"]);
        // `.` not followed by a digit is a dereference.
        assert_eq!(
            kinds("a.b"),
            vec![TokenKind::Ident, TokenKind::Dot, TokenKind::Ident, TokenKind::Semicolon]
        );
    }

    #[test]
    fn negative_literal_and_bare_minus() {
        assert_eq!(texts("-5"), vec!["-5", ";"]);
        let out = tokenize("- 5");
        assert!(matches!(
            out.error,
            Some(LexError { kind: LexErrorKind::UnexpectedCharacter('-'), .. })
        ));
        // Still a full token stream.
        assert_eq!(out.tokens.len(), 3);
    }

    #[test]
    fn string_escapes() {
        let out = tokenize(r#""a\tb\"c""#);
        assert!(out.error.is_none());
        assert_eq!(out.tokens[0].text, "a\tb\"c");
    }

    #[test]
    fn unterminated_string_still_yields_tokens() {
        let out = tokenize("\"abc");
        assert!(matches!(
            out.error,
            Some(LexError { kind: LexErrorKind::UnterminatedString, .. })
        ));
        assert_eq!(out.tokens[0].kind, TokenKind::Str);
        assert_eq!(out.tokens[0].text, "abc");
    }

    #[test]
    fn char_literal() {
        let out = tokenize(r"'\n'");
        assert!(out.error.is_none());
        assert_eq!(out.tokens[0].kind, TokenKind::Char);
        assert_eq!(out.tokens[0].text, "\n");
    }

    #[test]
    fn char_literal_length_is_checked() {
        let out = tokenize("'ab'");
        assert!(matches!(
            out.error,
            Some(LexError { kind: LexErrorKind::InvalidCharLiteral, .. })
        ));
        let out = tokenize("'a");
        assert!(matches!(
            out.error,
            Some(LexError { kind: LexErrorKind::UnterminatedChar, .. })
        ));
    }

    #[test]
    fn variable_sigil_is_part_of_identifier() {
        assert_eq!(texts("$a = 5"), vec!["$a", "=", "5", ";"]);
    }

    #[test]
    fn implicit_semicolon_appended_once() {
        let out = tokenize("x");
        assert_eq!(out.tokens.last().unwrap().kind, TokenKind::Semicolon);
        assert!(out.tokens.last().unwrap().span.is_empty());
        assert_eq!(
            out.tokens.iter().filter(|t| t.kind == TokenKind::Semicolon).count(),
            1
        );
    }

    #[test]
    fn unknown_character_reports_position() {
        let out = tokenize("a @ b");
        let err = out.error.unwrap();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
        assert_eq!(err.span.start, 2);
        // Error recovery: the offending character still occupies a token.
        assert_eq!(out.tokens[1].kind, TokenKind::Error);
        assert_eq!(out.tokens[2].text, "b");
    }

    /// Every non-whitespace character of arbitrary input is covered by some
    /// token, even when later structural parsing fails.
    #[test]
    fn full_coverage_on_malformed_input() {
        for source in ["Foo.Bar(1,2", "((([[", "a.=.b", "\"open", "x ) ]"] {
            let out = tokenize(source);
            let mut covered = vec![false; source.len()];
            for tok in &out.tokens {
                for flag in covered
                    .iter_mut()
                    .take(tok.span.end as usize)
                    .skip(tok.span.start as usize)
                {
                    *flag = true;
                }
            }
            for (i, c) in source.char_indices() {
                if !c.is_whitespace() {
                    assert!(covered[i], "byte {i} ({c:?}) of {source:?} uncovered");
                }
            }
        }
    }
}
