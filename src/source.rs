//! Pull-based character source for the tokenizing reader.
//!
//! [`Source`] supplies characters on demand from a borrowed string slice and
//! tracks the line/column position that lexical faults report. It is the only
//! piece of the reader that touches raw input; everything above it works in
//! whole characters.

/// A forward-only cursor over JSON text.
///
/// Characters are handed out one at a time via [`Source::next`]; [`Source::peek`]
/// looks ahead without consuming. Exhaustion is reported as `None`.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Source<'a> {
    pub fn new(input: &'a str) -> Self {
        Source {
            input,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Next character without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Character after the next one, for two-character lookahead (`//`, `/*`).
    #[must_use]
    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.position..].chars();
        chars.next();
        chars.next()
    }

    /// Consumes and returns the next character, advancing line/column.
    pub fn next(&mut self) -> Option<char> {
        let ch = self.input[self.position..].chars().next()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consumes the next character only if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.next();
            true
        } else {
            false
        }
    }

    /// True when the remaining input starts with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.position..].starts_with(prefix)
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// 1-based line of the next unconsumed character.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column of the next unconsumed character.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_position_across_newlines() {
        let mut src = Source::new("ab\ncd");
        assert_eq!(src.next(), Some('a'));
        assert_eq!(src.next(), Some('b'));
        assert_eq!((src.line(), src.column()), (1, 3));
        assert_eq!(src.next(), Some('\n'));
        assert_eq!((src.line(), src.column()), (2, 1));
        assert_eq!(src.next(), Some('c'));
        assert_eq!((src.line(), src.column()), (2, 2));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut src = Source::new("xy");
        assert_eq!(src.peek(), Some('x'));
        assert_eq!(src.peek_second(), Some('y'));
        assert_eq!(src.peek(), Some('x'));
        assert_eq!(src.next(), Some('x'));
    }

    #[test]
    fn eat_is_conditional() {
        let mut src = Source::new(":1");
        assert!(!src.eat(','));
        assert!(src.eat(':'));
        assert_eq!(src.peek(), Some('1'));
    }

    #[test]
    fn multibyte_advances_by_char() {
        let mut src = Source::new("é!");
        assert_eq!(src.next(), Some('é'));
        assert_eq!(src.column(), 2);
        assert_eq!(src.next(), Some('!'));
        assert!(src.at_end());
    }
}
