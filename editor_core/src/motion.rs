//! Motions: pure computations from a cursor to a target range.
//!
//! Every motion is a variant of [`Motion`]. Granularity is fixed per
//! variant:
//!
//! | motion                        | linewise | inclusive |
//! |-------------------------------|----------|-----------|
//! | `h` `l` `w` `b` `0` `^` `n` `N` | no     | no        |
//! | `e` `$`                       | no       | yes       |
//! | `j` `k` `gg` `G` `H` `M` `L`  | yes      | no        |
//! | current line (`dd`, `>>`)     | yes      | no        |

use crate::position::{
    char_len, first_non_blank, last_line, line_len, offset_from_position, Position,
};
use crate::search::SearchMatch;
use crate::viewport::ViewportGeometry;

/// Viewport height assumed when the renderer supplies no geometry.
pub const DEFAULT_VIEWPORT_LINES: usize = 40;

/// The span an operator acts on.
///
/// `start` and `end` may be in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VimRange {
    pub start: Position,
    pub end: Position,
    pub inclusive: bool,
    pub linewise: bool,
}

impl VimRange {
    pub fn new(start: Position, end: Position, inclusive: bool, linewise: bool) -> Self {
        Self {
            start,
            end,
            inclusive,
            linewise,
        }
    }

    /// An empty character-wise range at `position`.
    pub fn at(position: Position) -> Self {
        Self::new(position, position, false, false)
    }

    /// The range with `start` and `end` ordered by offset.
    pub fn normalized(&self) -> (Position, Position) {
        if self.start.offset <= self.end.offset {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    /// First and last line covered.
    pub fn line_span(&self) -> (usize, usize) {
        (
            self.start.line.min(self.end.line),
            self.start.line.max(self.end.line),
        )
    }

    /// The target of the motion that produced the range.
    pub fn target(&self) -> Position {
        self.end
    }
}

/// Extra inputs a motion may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionMeta<'a> {
    /// Whether the count was typed rather than defaulted.
    pub explicit_count: bool,
    /// Whether an operator is waiting on this motion.
    pub operator_pending: bool,
    /// Column remembered across vertical moves.
    pub preferred_column: Option<usize>,
    pub viewport: Option<ViewportGeometry>,
    pub search_matches: &'a [SearchMatch],
}

/// A named motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    Down,
    Up,
    WordForward,
    WordBackward,
    WordEnd,
    LineStart,
    FirstNonBlank,
    LineEnd,
    FileStart,
    FileEnd,
    ViewportTop,
    ViewportMiddle,
    ViewportBottom,
    /// `count` lines starting at the cursor; produced by doubled operators.
    CurrentLine,
    SearchNext,
    SearchPrev,
}

impl Motion {
    /// Maps a single normal-mode key to a motion. `gg` is handled by the
    /// caller since it needs a prefix.
    pub fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'h' => Self::Left,
            'l' | ' ' => Self::Right,
            'j' => Self::Down,
            'k' => Self::Up,
            'w' => Self::WordForward,
            'b' => Self::WordBackward,
            'e' => Self::WordEnd,
            '0' => Self::LineStart,
            '^' => Self::FirstNonBlank,
            '$' => Self::LineEnd,
            'G' => Self::FileEnd,
            'H' => Self::ViewportTop,
            'M' => Self::ViewportMiddle,
            'L' => Self::ViewportBottom,
            'n' => Self::SearchNext,
            'N' => Self::SearchPrev,
            _ => return None,
        })
    }

    pub fn is_linewise(&self) -> bool {
        matches!(
            self,
            Self::Down
                | Self::Up
                | Self::FileStart
                | Self::FileEnd
                | Self::ViewportTop
                | Self::ViewportMiddle
                | Self::ViewportBottom
                | Self::CurrentLine
        )
    }

    pub fn is_inclusive(&self) -> bool {
        matches!(self, Self::WordEnd | Self::LineEnd)
    }

    /// Whether the motion keeps the preferred column across lines.
    pub fn is_vertical(&self) -> bool {
        matches!(self, Self::Down | Self::Up)
    }

    /// Computes the range from `cursor` to the motion's target.
    pub fn apply(
        &self,
        cursor: Position,
        lines: &[String],
        count: usize,
        meta: &MotionMeta<'_>,
    ) -> VimRange {
        let count = count.max(1);
        let buffer_empty = lines.iter().all(|l| l.is_empty()) && lines.len() <= 1;
        if buffer_empty {
            return VimRange::at(cursor);
        }

        let target = match self {
            Self::Left => {
                let column = cursor.column.saturating_sub(count);
                at(cursor.line, column, lines)
            }
            Self::Right => {
                let column = (cursor.column + count).min(line_len(lines, cursor.line));
                at(cursor.line, column, lines)
            }
            Self::Down | Self::Up => {
                let line = if *self == Self::Down {
                    cursor.line.saturating_add(count).min(last_line(lines))
                } else {
                    cursor.line.saturating_sub(count)
                };
                // `dj` on the last line fails rather than acting on it.
                if line == cursor.line && meta.operator_pending {
                    return VimRange::at(cursor);
                }
                let column = meta.preferred_column.unwrap_or(cursor.column);
                at(line, column, lines)
            }
            Self::WordForward => word_forward(cursor, lines, count, meta.operator_pending),
            Self::WordBackward => word_backward(cursor, lines, count),
            Self::WordEnd => word_end(cursor, lines, count),
            Self::LineStart => at(cursor.line, 0, lines),
            Self::FirstNonBlank => at(cursor.line, first_non_blank(&lines[cursor.line]), lines),
            Self::LineEnd => {
                let line = (cursor.line + count - 1).min(last_line(lines));
                at(line, line_len(lines, line).saturating_sub(1), lines)
            }
            Self::FileStart => {
                let line = if meta.explicit_count { count - 1 } else { 0 };
                line_target(line, lines)
            }
            Self::FileEnd => {
                let line = if meta.explicit_count {
                    count - 1
                } else {
                    last_line(lines)
                };
                line_target(line, lines)
            }
            Self::ViewportTop | Self::ViewportMiddle | Self::ViewportBottom => {
                viewport_target(*self, lines, count, meta)
            }
            Self::CurrentLine => {
                let line = (cursor.line + count - 1).min(last_line(lines));
                at(line, cursor.column, lines)
            }
            Self::SearchNext => search_target(cursor, lines, count, meta.search_matches, true),
            Self::SearchPrev => search_target(cursor, lines, count, meta.search_matches, false),
        };

        // `$` and `e` on an empty line have nothing to include.
        let inclusive = self.is_inclusive() && line_len(lines, target.line) > 0;
        let start = if *self == Self::CurrentLine {
            at(cursor.line, cursor.column, lines)
        } else {
            cursor
        };
        VimRange::new(start, target, inclusive, self.is_linewise())
    }
}

fn at(line: usize, column: usize, lines: &[String]) -> Position {
    Position::from_line_column(line, column, lines)
}

/// First non-blank of `line`, clamped into the buffer.
fn line_target(line: usize, lines: &[String]) -> Position {
    let line = line.min(last_line(lines));
    at(line, first_non_blank(&lines[line]), lines)
}

fn viewport_target(
    motion: Motion,
    lines: &[String],
    count: usize,
    meta: &MotionMeta<'_>,
) -> Position {
    let geometry = meta.viewport.unwrap_or(ViewportGeometry {
        top_line: 0,
        visible_lines: DEFAULT_VIEWPORT_LINES,
    });
    let top = geometry.top_line.min(last_line(lines));
    let bottom = top
        .saturating_add(geometry.visible_lines.max(1) - 1)
        .min(last_line(lines));
    let offset = if meta.explicit_count { count - 1 } else { 0 };

    let line = match motion {
        Motion::ViewportTop => top.saturating_add(offset).min(bottom),
        Motion::ViewportBottom => bottom.saturating_sub(offset).max(top),
        _ => top + (bottom - top) / 2,
    };
    line_target(line, lines)
}

/// Character classes that delimit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Whitespace,
    Word,
    Punctuation,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// The buffer as one char sequence, lines joined with `'\n'`.
fn flatten(lines: &[String]) -> Vec<char> {
    let mut chars = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            chars.push('\n');
        }
        chars.extend(line.chars());
    }
    chars
}

fn position_of(offset: usize, lines: &[String]) -> Position {
    let mut remaining = offset;
    for (i, line) in lines.iter().enumerate() {
        let len = char_len(line);
        if remaining <= len {
            return Position::new(i, remaining, offset);
        }
        remaining -= len + 1;
    }
    let line = last_line(lines);
    let column = line_len(lines, line);
    Position::new(line, column, offset_from_position(line, column, lines))
}

/// An empty line is a word on its own.
fn is_empty_line_at(chars: &[char], i: usize) -> bool {
    chars[i] == '\n' && (i == 0 || chars[i - 1] == '\n')
}

fn word_forward(cursor: Position, lines: &[String], count: usize, operator_pending: bool) -> Position {
    let chars = flatten(lines);
    let len = chars.len();
    let mut i = cursor.offset.min(len);

    for _ in 0..count {
        if i >= len {
            break;
        }
        let class = classify(chars[i]);
        if class != CharClass::Whitespace {
            while i < len && classify(chars[i]) == class {
                i += 1;
            }
        } else if is_empty_line_at(&chars, i) {
            i += 1;
        }
        while i < len && classify(chars[i]) == CharClass::Whitespace && !is_empty_line_at(&chars, i) {
            i += 1;
        }
    }

    let target = position_of(i, lines);
    // An operator stops at the end of the line the last word was on.
    if operator_pending && target.line > cursor.line && target.column <= first_non_blank(&lines[target.line]) {
        let line = target.line - 1;
        if line >= cursor.line {
            return at(line, line_len(lines, line), lines);
        }
    }
    target
}

fn word_backward(cursor: Position, lines: &[String], count: usize) -> Position {
    let chars = flatten(lines);
    let mut i = cursor.offset.min(chars.len());

    for _ in 0..count {
        if i == 0 {
            break;
        }
        i -= 1;
        while i > 0 && classify(chars[i]) == CharClass::Whitespace && !is_empty_line_at(&chars, i) {
            i -= 1;
        }
        let class = classify(chars[i]);
        if class != CharClass::Whitespace {
            while i > 0 && classify(chars[i - 1]) == class {
                i -= 1;
            }
        }
    }
    position_of(i, lines)
}

/// Range changed by `cw` when the cursor is on a non-blank: up to the end of
/// the current word, then `count - 1` further word ends.
pub fn change_word_range(cursor: Position, lines: &[String], count: usize) -> VimRange {
    let target = word_end_from(cursor, lines, count.max(1), true);
    VimRange::new(cursor, target, true, false)
}

fn word_end(cursor: Position, lines: &[String], count: usize) -> Position {
    word_end_from(cursor, lines, count, false)
}

/// With `stay_in_word`, the first step ends the word under the cursor
/// instead of advancing to the next one.
fn word_end_from(cursor: Position, lines: &[String], count: usize, stay_in_word: bool) -> Position {
    let chars = flatten(lines);
    let len = chars.len();
    let mut i = cursor.offset.min(len);

    for step in 0..count {
        if step == 0 && stay_in_word && i < len && classify(chars[i]) != CharClass::Whitespace {
            let class = classify(chars[i]);
            while i + 1 < len && classify(chars[i + 1]) == class {
                i += 1;
            }
            continue;
        }
        if i + 1 >= len {
            break;
        }
        i += 1;
        while i + 1 < len && classify(chars[i]) == CharClass::Whitespace {
            i += 1;
        }
        let class = classify(chars[i]);
        while i + 1 < len && classify(chars[i + 1]) == class && class != CharClass::Whitespace {
            i += 1;
        }
    }
    position_of(i, lines)
}

fn search_target(
    cursor: Position,
    lines: &[String],
    count: usize,
    matches: &[SearchMatch],
    forward: bool,
) -> Position {
    if matches.is_empty() {
        return cursor;
    }
    let mut offset = cursor.offset;
    for _ in 0..count {
        let next = if forward {
            matches
                .iter()
                .find(|m| m.start > offset)
                .or_else(|| matches.first())
        } else {
            matches
                .iter()
                .rev()
                .find(|m| m.start < offset)
                .or_else(|| matches.last())
        };
        match next {
            Some(m) => offset = m.start,
            None => break,
        }
    }
    position_of(offset, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::split_lines;

    fn lines(text: &str) -> Vec<String> {
        split_lines(text)
    }

    fn run(motion: Motion, text: &str, offset: usize, count: usize, explicit: bool) -> VimRange {
        let lines = lines(text);
        let cursor = Position::from_offset(text, offset);
        let meta = MotionMeta {
            explicit_count: explicit,
            ..Default::default()
        };
        motion.apply(cursor, &lines, count, &meta)
    }

    #[test]
    fn test_file_end_without_count() {
        let range = run(Motion::FileEnd, "abc\ndef\nghi", 0, 1, false);
        assert_eq!(range.end.line, 2);
        assert_eq!(range.end.column, 0);
        assert!(range.linewise);
        assert!(!range.inclusive);
    }

    #[test]
    fn test_file_end_always_last_line() {
        for text in ["x", "a\nb", "a\n\n\n", "  lead\n  more"] {
            let range = run(Motion::FileEnd, text, 0, 1, false);
            assert_eq!(range.end.line, lines(text).len() - 1);
        }
    }

    #[test]
    fn test_file_end_with_count() {
        let range = run(Motion::FileEnd, "a\nb\nc", 0, 2, true);
        assert_eq!(range.end.line, 1);
        let range = run(Motion::FileEnd, "a\nb\nc", 0, 99, true);
        assert_eq!(range.end.line, 2);
    }

    #[test]
    fn test_file_start_count() {
        let text = "a\n  b\nc";
        assert_eq!(run(Motion::FileStart, text, 6, 1, false).end.line, 0);
        let range = run(Motion::FileStart, text, 6, 2, true);
        assert_eq!(range.end.line, 1);
        assert_eq!(range.end.column, 2);
        // An explicit count of one differs from no count only for `G`.
        assert_eq!(run(Motion::FileStart, text, 6, 1, true).end.line, 0);
        assert_eq!(run(Motion::FileEnd, text, 0, 1, true).end.line, 0);
    }

    #[test]
    fn test_left_right_stay_on_line() {
        let text = "abc\ndef";
        assert_eq!(run(Motion::Left, text, 4, 3, false).end.offset, 4);
        assert_eq!(run(Motion::Right, text, 1, 10, false).end.offset, 3);
    }

    #[test]
    fn test_down_keeps_column() {
        let text = "hello\nhi\nworld";
        let range = run(Motion::Down, text, 4, 1, false);
        assert_eq!((range.end.line, range.end.column), (1, 2));

        let lines = lines(text);
        let meta = MotionMeta {
            preferred_column: Some(4),
            ..Default::default()
        };
        let range = Motion::Down.apply(range.end, &lines, 1, &meta);
        assert_eq!((range.end.line, range.end.column), (2, 4));
    }

    #[test]
    fn test_word_forward() {
        let text = "foo bar.baz\nqux";
        assert_eq!(run(Motion::WordForward, text, 0, 1, false).end.offset, 4);
        assert_eq!(run(Motion::WordForward, text, 4, 1, false).end.offset, 7);
        assert_eq!(run(Motion::WordForward, text, 7, 1, false).end.offset, 8);
        assert_eq!(run(Motion::WordForward, text, 8, 1, false).end.offset, 12);
        assert_eq!(run(Motion::WordForward, text, 0, 3, false).end.offset, 8);
    }

    #[test]
    fn test_word_forward_with_operator_stops_at_line_end() {
        let text = "foo bar\nbaz";
        let lines = lines(text);
        let meta = MotionMeta {
            operator_pending: true,
            ..Default::default()
        };
        let cursor = Position::from_offset(text, 4);
        let range = Motion::WordForward.apply(cursor, &lines, 1, &meta);
        assert_eq!(range.end.offset, 7);
    }

    #[test]
    fn test_word_backward() {
        let text = "foo bar.baz";
        assert_eq!(run(Motion::WordBackward, text, 8, 1, false).end.offset, 7);
        assert_eq!(run(Motion::WordBackward, text, 7, 1, false).end.offset, 4);
        assert_eq!(run(Motion::WordBackward, text, 4, 1, false).end.offset, 0);
        assert_eq!(run(Motion::WordBackward, text, 0, 1, false).end.offset, 0);
    }

    #[test]
    fn test_word_end() {
        let text = "foo bar";
        let range = run(Motion::WordEnd, text, 0, 1, false);
        assert_eq!(range.end.offset, 2);
        assert!(range.inclusive);
        assert_eq!(run(Motion::WordEnd, text, 2, 1, false).end.offset, 6);
    }

    #[test]
    fn test_change_word_range() {
        let text = "foo bar";
        let lines = lines(text);
        let end_of_word = Position::from_offset(text, 2);
        let range = change_word_range(end_of_word, &lines, 1);
        assert_eq!((range.start.offset, range.end.offset), (2, 2));
        assert!(range.inclusive);

        let range = change_word_range(Position::origin(), &lines, 2);
        assert_eq!(range.end.offset, 6);
        let single = change_word_range(Position::origin(), &self::lines("a bc"), 1);
        assert_eq!(single.end.offset, 0);
    }

    #[test]
    fn test_vertical_motion_at_edge() {
        let text = "a\nb";
        let lines = lines(text);
        let pending = MotionMeta {
            operator_pending: true,
            ..Default::default()
        };
        let last = Position::from_offset(text, 2);
        let range = Motion::Down.apply(last, &lines, 1, &pending);
        assert_eq!(range, VimRange::at(last));
        assert!(!range.linewise);
        let range = Motion::Up.apply(Position::origin(), &lines, 3, &pending);
        assert_eq!(range, VimRange::at(Position::origin()));

        // Without an operator the cursor simply stays put.
        let range = Motion::Down.apply(last, &lines, 1, &MotionMeta::default());
        assert_eq!(range.end.line, 1);
        assert!(range.linewise);
    }

    #[test]
    fn test_viewport_geometry_does_not_overflow() {
        let meta = MotionMeta {
            viewport: Some(ViewportGeometry {
                top_line: usize::MAX,
                visible_lines: usize::MAX,
            }),
            explicit_count: true,
            ..Default::default()
        };
        let lines = lines("a\nb\nc");
        let cursor = Position::origin();
        assert_eq!(Motion::ViewportBottom.apply(cursor, &lines, 1, &meta).end.line, 2);
        assert_eq!(Motion::ViewportTop.apply(cursor, &lines, 5, &meta).end.line, 2);
    }

    #[test]
    fn test_line_motions() {
        let text = "   indented line";
        assert_eq!(run(Motion::LineStart, text, 8, 1, false).end.offset, 0);
        assert_eq!(run(Motion::FirstNonBlank, text, 8, 1, false).end.offset, 3);
        let end = run(Motion::LineEnd, text, 0, 1, false);
        assert_eq!(end.end.offset, 15);
        assert!(end.inclusive);
        assert!(!end.linewise);
    }

    #[test]
    fn test_line_end_on_empty_line_not_inclusive() {
        let range = run(Motion::LineEnd, "a\n\nb", 2, 1, false);
        assert_eq!(range.end.offset, 2);
        assert!(!range.inclusive);
    }

    #[test]
    fn test_viewport_motions_with_geometry() {
        let text: String = (0..100).map(|i| format!("line{}\n", i)).collect();
        let lines = lines(&text);
        let cursor = Position::origin();
        let meta = MotionMeta {
            viewport: Some(ViewportGeometry {
                top_line: 10,
                visible_lines: 20,
            }),
            ..Default::default()
        };
        assert_eq!(Motion::ViewportTop.apply(cursor, &lines, 1, &meta).end.line, 10);
        assert_eq!(Motion::ViewportMiddle.apply(cursor, &lines, 1, &meta).end.line, 19);
        assert_eq!(Motion::ViewportBottom.apply(cursor, &lines, 1, &meta).end.line, 29);

        let counted = MotionMeta {
            explicit_count: true,
            ..meta
        };
        assert_eq!(Motion::ViewportTop.apply(cursor, &lines, 3, &counted).end.line, 12);
        assert_eq!(Motion::ViewportBottom.apply(cursor, &lines, 3, &counted).end.line, 27);
    }

    #[test]
    fn test_viewport_motions_without_geometry() {
        let text: String = (0..100).map(|i| format!("l{}\n", i)).collect();
        let range = run(Motion::ViewportBottom, &text, 0, 1, false);
        assert_eq!(range.end.line, DEFAULT_VIEWPORT_LINES - 1);

        let short = run(Motion::ViewportBottom, "a\nb", 0, 1, false);
        assert_eq!(short.end.line, 1);
    }

    #[test]
    fn test_current_line_count() {
        let range = run(Motion::CurrentLine, "a\nb\nc\nd", 2, 2, true);
        assert_eq!(range.line_span(), (1, 2));
        assert!(range.linewise);
    }

    #[test]
    fn test_empty_buffer_returns_cursor() {
        for motion in [Motion::FileEnd, Motion::WordForward, Motion::Down, Motion::LineEnd] {
            let range = run(motion, "", 0, 3, true);
            assert_eq!(range.start, range.end);
            assert_eq!(range.end, Position::origin());
        }
    }

    #[test]
    fn test_search_motions_wrap() {
        let text = "a b a c a";
        let lines = lines(text);
        let matches = [
            SearchMatch::new(0, 1),
            SearchMatch::new(4, 5),
            SearchMatch::new(8, 9),
        ];
        let meta = MotionMeta {
            search_matches: &matches,
            ..Default::default()
        };
        let cursor = Position::from_offset(text, 4);
        assert_eq!(Motion::SearchNext.apply(cursor, &lines, 1, &meta).end.offset, 8);
        assert_eq!(Motion::SearchNext.apply(cursor, &lines, 2, &meta).end.offset, 0);
        assert_eq!(Motion::SearchPrev.apply(cursor, &lines, 1, &meta).end.offset, 0);
        let start = Position::origin();
        assert_eq!(Motion::SearchPrev.apply(start, &lines, 1, &meta).end.offset, 8);
    }

    #[test]
    fn test_normalized_range() {
        let a = Position::new(0, 5, 5);
        let b = Position::new(0, 1, 1);
        let range = VimRange::new(a, b, false, false);
        assert_eq!(range.normalized(), (b, a));
    }
}
