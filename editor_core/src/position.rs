//! Conversions between linear offsets and line/column coordinates.
//!
//! Offsets and columns of [`Position`] count characters. The byte-based
//! variants produce the `(row, byte column)` points the incremental parser
//! expects.

/// A position in a buffer snapshot.
///
/// `offset` is the character index that converts back to `line`/`column`
/// for the snapshot it was computed against. Positions are recomputed after
/// every mutation, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Position at the start of the buffer.
    pub fn origin() -> Self {
        Self::default()
    }

    /// Builds a position from a character offset into `content`.
    pub fn from_offset(content: &str, offset: usize) -> Self {
        let point = point_from_offset(content, offset);
        let offset = offset.min(char_len(content));
        Self::new(point.row, point.column, offset)
    }

    /// Builds a position from a line and column, clamping both to the buffer.
    pub fn from_line_column(line: usize, column: usize, lines: &[String]) -> Self {
        let line = clamp_line(line, lines);
        let column = column.min(line_len(lines, line));
        let offset = offset_from_position(line, column, lines);
        Self::new(line, column, offset)
    }
}

/// A row/column pair without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Converts a character offset to a point, counting characters.
/// Offsets past the end clamp to the end of the content.
pub fn point_from_offset(content: &str, offset: usize) -> Point {
    let mut point = Point::default();
    for ch in content.chars().take(offset) {
        if ch == '\n' {
            point.row += 1;
            point.column = 0;
        } else {
            point.column += 1;
        }
    }
    point
}

/// Converts a byte offset to a point whose column is measured in bytes.
pub fn byte_point_from_offset(content: &str, byte_offset: usize) -> Point {
    let end = byte_offset.min(content.len());
    let prefix = &content.as_bytes()[..end];
    let row = prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    Point::new(row, end - line_start)
}

/// Converts a line/column pair to a character offset.
///
/// Sums the lengths of all prior lines plus one separator per line. A line
/// past the end clamps to the last line and the column clamps to the line.
pub fn offset_from_position(line: usize, column: usize, lines: &[String]) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let line = clamp_line(line, lines);
    let before: usize = lines[..line].iter().map(|l| char_len(l) + 1).sum();
    before + column.min(char_len(&lines[line]))
}

/// Splits content into lines on `'\n'`. A trailing newline yields a final
/// empty line, so the result is never empty.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}

/// Column of the first non-whitespace character, or 0 for blank lines.
pub fn first_non_blank(line: &str) -> usize {
    line.chars().position(|c| !c.is_whitespace()).unwrap_or(0)
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the character at `char_offset`, clamped to the end.
pub fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Character offset of the byte index `byte_offset`.
pub fn char_index(text: &str, byte_offset: usize) -> usize {
    let end = byte_offset.min(text.len());
    text.char_indices().take_while(|&(i, _)| i < end).count()
}

/// Length in characters of `line`, or 0 when out of range.
pub fn line_len(lines: &[String], line: usize) -> usize {
    lines.get(line).map(|l| char_len(l)).unwrap_or(0)
}

/// Index of the last line.
pub fn last_line(lines: &[String]) -> usize {
    lines.len().saturating_sub(1)
}

fn clamp_line(line: usize, lines: &[String]) -> usize {
    line.min(last_line(lines))
}
