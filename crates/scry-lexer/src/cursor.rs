/// Byte-level source iterator for the scry lexer.
///
/// Wraps the command text and provides character-by-character iteration
/// with byte-offset position tracking. All positions are byte offsets into
/// the original UTF-8 input.
pub struct Cursor<'src> {
    pos: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    /// Create a new cursor at the start of the input.
    pub fn new(source: &'src str) -> Self {
        Self {
            pos: 0,
            chars: source.chars(),
        }
    }

    /// Look at the current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Look at the character after the current one without consuming anything.
    pub fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    /// Consume the current character and advance the position.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    /// Current byte offset.
    pub fn pos(&self) -> u32 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_and_advance() {
        let mut cur = Cursor::new("ab");
        assert_eq!(cur.peek(), Some('a'));
        assert_eq!(cur.peek_next(), Some('b'));
        assert_eq!(cur.advance(), Some('a'));
        assert_eq!(cur.pos(), 1);
        assert_eq!(cur.advance(), Some('b'));
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.advance(), None);
    }

    #[test]
    fn multibyte_positions_are_byte_offsets() {
        let mut cur = Cursor::new("é5");
        cur.advance();
        assert_eq!(cur.pos(), 2);
        assert_eq!(cur.peek(), Some('5'));
    }
}
