use crate::text::{Position, Span};
use memchr::memchr_iter;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Identifier of a lexical category: an index into the vocabulary that
/// declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TokenKind(pub(crate) u16);

impl TokenKind {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u16::try_from(index).unwrap_or(u16::MAX))
    }
}

/// A `(kind, start, length)` triple into the scanned buffer.
///
/// Structural tokens (end-of-line, indent, dedent, end-of-stream) have
/// length 0; error tokens cover the single unmatched character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub length: u32,
}

impl Token {
    /// Byte offset one past the last byte of the token.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.start + self.length
    }
}

/// The result of scanning a buffer: the buffer itself, the emitted
/// tokens in source order, and the offset of every newline.
#[derive(Debug, Clone)]
pub struct TokenStream {
    buffer: String,
    tokens: Vec<Token>,
    newline_offsets: Vec<u32>,
    has_errors: bool,
    truncated: bool,
}

impl TokenStream {
    pub(crate) fn new(buffer: String, tokens: Vec<Token>, has_errors: bool, truncated: bool) -> Self {
        let newline_offsets = memchr_iter(b'\n', buffer.as_bytes())
            .map(|offset| u32::try_from(offset).unwrap_or(u32::MAX))
            .collect();
        Self {
            buffer,
            tokens,
            newline_offsets,
            has_errors,
            truncated,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Byte offsets of every `'\n'` in the buffer, ascending.
    #[must_use]
    pub fn newline_offsets(&self) -> &[u32] {
        &self.newline_offsets
    }

    /// Whether any error token was emitted.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Whether the input was declared truncated; a truncated stream has
    /// no synthetic trailing end-of-line, dedent, or end-of-stream.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The slice of the buffer covered by `token`.
    #[must_use]
    pub fn text_of(&self, token: &Token) -> &str {
        &self.buffer[token.start as usize..token.end() as usize]
    }

    /// Line and column of a byte offset, computed from the newline list.
    #[must_use]
    pub fn position_at(&self, offset: u32) -> Position {
        let line_index = self.newline_offsets.partition_point(|&nl| nl < offset);
        let line_start = if line_index == 0 {
            0
        } else {
            self.newline_offsets[line_index - 1] + 1
        };
        Position::new(
            offset,
            u32::try_from(line_index).unwrap_or(u32::MAX - 1) + 1,
            offset - line_start + 1,
        )
    }

    #[must_use]
    pub fn span_of(&self, token: &Token) -> Span {
        Span::new(self.position_at(token.start), token.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(buffer: &str) -> TokenStream {
        TokenStream::new(buffer.to_owned(), Vec::new(), false, false)
    }

    #[test]
    fn test_newline_offsets() {
        let s = stream("a\nbb\n\nc");
        assert_eq!(s.newline_offsets(), &[1, 4, 5]);
    }

    #[test]
    fn test_position_at_first_line() {
        let s = stream("abc\ndef");
        assert_eq!(s.position_at(0), Position::new(0, 1, 1));
        assert_eq!(s.position_at(2), Position::new(2, 1, 3));
    }

    #[test]
    fn test_position_at_later_lines() {
        let s = stream("abc\ndef\n");
        assert_eq!(s.position_at(4), Position::new(4, 2, 1));
        assert_eq!(s.position_at(6), Position::new(6, 2, 3));
        // the offset just past a newline starts the next line
        assert_eq!(s.position_at(8).line, 3);
    }

    #[test]
    fn test_span_of() {
        let s = stream("ab\ncd");
        let token = Token {
            kind: TokenKind(0),
            start: 3,
            length: 2,
        };
        let span = s.span_of(&token);
        assert_eq!(span.start, Position::new(3, 2, 1));
        assert_eq!(span.length, 2);
    }
}
