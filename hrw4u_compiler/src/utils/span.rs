//! Source location tracking
//!
//! Positions count characters, not display cells: a tab advances the column
//! by one so that diagnostics can place the caret by character offset.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in source text with line, column, and byte offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Byte offset from start of input (0-based)
    pub offset: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number in characters (1-based)
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Offset 0, line 1, column 1
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn advance(self, ch: char) -> Self {
        match ch {
            '\n' => Self {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
            },
            _ => Self {
                offset: self.offset + ch.len_utf8(),
                line: self.line,
                column: self.column + 1,
            },
        }
    }

    pub fn advance_str(self, s: &str) -> Self {
        s.chars().fold(self, |pos, ch| pos.advance(ch))
    }

    /// 0-based character column, as used in rendered diagnostics
    pub fn zero_based_column(&self) -> usize {
        self.column.saturating_sub(1) as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of source text from start to end position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.offset <= end.offset,
            "Span start must not be after end"
        );
        Self { start, end }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    /// Create a single-character span
    pub fn single(pos: Position) -> Self {
        let end = Position {
            offset: pos.offset + 1,
            line: pos.line,
            column: pos.column + 1,
        };
        Self { start: pos, end }
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Self) -> Self {
        let start = if self.start.offset < other.start.offset {
            self.start
        } else {
            other.start
        };

        let end = if self.end.offset > other.end.offset {
            self.end
        } else {
            other.end
        };

        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// Get the source text for this span from the input
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input
            .get(self.start.offset..self.end.offset)
            .unwrap_or_default()
    }

    /// Span for generated nodes with no source location
    pub fn dummy() -> Self {
        Self {
            start: Position::start(),
            end: Position::start(),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{}-{}",
                self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A value with its source location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    /// Map the value while preserving the span
    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Source text with a line index, used to recover the text of a line for
/// diagnostics
#[derive(Debug, Clone)]
pub struct SourceMap {
    pub source: String,
    /// Byte offsets of line starts
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Line and column for a byte offset
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);

        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0);

        Position::new(offset, (line + 1) as u32, (column + 1) as u32)
    }

    /// Text of a line (1-based), without the line terminator
    pub fn get_line(&self, line_num: u32) -> Option<&str> {
        if line_num == 0 {
            return None;
        }

        let line_idx = (line_num - 1) as usize;
        let start = *self.line_starts.get(line_idx)?;
        let end = match self.line_starts.get(line_idx + 1) {
            Some(next) => next - 1,
            None => self.source.len(),
        };

        if start > self.source.len() || (start == self.source.len() && line_idx > 0) {
            return None;
        }

        self.source
            .get(start..end)
            .map(|line| line.trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_advance() {
        let pos = Position::start().advance_str("ab\tc");
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.zero_based_column(), 4);

        let pos = pos.advance('\n');
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_multibyte_offsets() {
        let pos = Position::start().advance('é');
        assert_eq!(pos.offset, 2);
        assert_eq!(pos.column, 2);
    }

    #[test]
    fn test_span_merge_and_display() {
        let a = Span::new(Position::new(0, 1, 1), Position::new(3, 1, 4));
        let b = Span::new(Position::new(5, 1, 6), Position::new(8, 1, 9));
        let merged = a.merge(b);

        assert_eq!(merged.len(), 8);
        assert_eq!(merged.to_string(), "1:1-9");
        assert_eq!(merged.slice("abc  def"), "abc  def");
    }

    #[test]
    fn test_source_map_lines() {
        let map = SourceMap::new("REMAP {\r\n  break;\n}".to_string());

        assert_eq!(map.get_line(1), Some("REMAP {"));
        assert_eq!(map.get_line(2), Some("  break;"));
        assert_eq!(map.get_line(3), Some("}"));
        assert_eq!(map.get_line(4), None);
        assert_eq!(map.get_line(0), None);
    }

    #[test]
    fn test_position_at() {
        let map = SourceMap::new("ab\ncd".to_string());
        let pos = map.position_at(4);
        assert_eq!((pos.line, pos.column), (2, 2));
    }
}
