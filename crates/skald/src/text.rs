#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte offset into a source buffer together with its 1-based line and
/// column.
///
/// Line 0 and column 0 are reserved for the default ("nowhere") value
/// produced by [`Position::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// An inclusive-start span: a starting [`Position`] and a byte length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Span {
    pub start: Position,
    pub length: u32,
}

impl Position {
    #[must_use]
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Move within the current line by a signed number of bytes.
    ///
    /// Returns `None` when the resulting column would fall below 1.
    #[must_use]
    pub fn shift_column(self, delta: i32) -> Option<Self> {
        let column = i64::from(self.column) + i64::from(delta);
        let offset = i64::from(self.offset) + i64::from(delta);
        if column < 1 || offset < 0 {
            return None;
        }
        Some(Self {
            offset: u32::try_from(offset).ok()?,
            line: self.line,
            column: u32::try_from(column).ok()?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Span {
    #[must_use]
    pub const fn new(start: Position, length: u32) -> Self {
        Self { start, length }
    }

    /// Byte offset one past the last byte of the span.
    #[must_use]
    pub const fn end_offset(self) -> u32 {
        self.start.offset + self.length
    }

    /// The same span with a different length.
    #[must_use]
    pub const fn with_length(self, length: u32) -> Self {
        Self {
            start: self.start,
            length,
        }
    }

    /// Whether this span equals or contains `other`, compared by byte
    /// range only.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start.offset <= other.start.offset && other.end_offset() <= self.end_offset()
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = self.end_offset().max(other.end_offset());
        Self {
            start,
            length: end - start.offset,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.offset, self.end_offset())
    }
}

#[cfg(feature = "diagnostics")]
impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        Self::new(
            miette::SourceOffset::from(span.start.offset as usize),
            span.length as usize,
        )
    }
}
