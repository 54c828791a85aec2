//! The buffer collaborator the engine edits through.

use crate::position::{split_lines, Position};

/// Live view of a buffer owned outside the engine.
///
/// `lines()` must always equal `content()` split on `'\n'`.
pub trait EditorContext {
    fn content(&self) -> String;

    fn lines(&self) -> Vec<String> {
        split_lines(&self.content())
    }

    fn cursor(&self) -> Position;

    fn tab_size(&self) -> usize;

    /// Replaces the buffer content.
    fn update_content(&mut self, text: &str);

    fn set_cursor_position(&mut self, position: Position);
}

/// Immutable copy of a buffer taken at command invocation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: String,
    pub lines: Vec<String>,
    pub cursor: Position,
    pub tab_size: usize,
}

impl Snapshot {
    /// Creates a snapshot with the cursor at the given character offset.
    pub fn new(content: impl Into<String>, cursor_offset: usize, tab_size: usize) -> Self {
        let content = content.into();
        let lines = split_lines(&content);
        let cursor = Position::from_offset(&content, cursor_offset);
        Self {
            content,
            lines,
            cursor,
            tab_size,
        }
    }

    pub fn from_context<C: EditorContext + ?Sized>(ctx: &C) -> Self {
        Self::new(ctx.content(), ctx.cursor().offset, ctx.tab_size())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of characters in the snapshot.
    pub fn len_chars(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_derives_lines_and_cursor() {
        let snap = Snapshot::new("ab\ncd", 4, 4);
        assert_eq!(snap.lines, vec!["ab", "cd"]);
        assert_eq!(snap.cursor, Position::new(1, 1, 4));
        assert_eq!(snap.len_chars(), 5);
    }

    #[test]
    fn test_snapshot_clamps_cursor() {
        let snap = Snapshot::new("ab", 10, 2);
        assert_eq!(snap.cursor.offset, 2);
    }
}
