//! Undo/Redo history system.
//!
//! Edits are recorded as minimal splices derived from the edit calculator.
//! A group holds every splice of one command, or of one insert session, so
//! `u` reverts it in a single step.

use crate::edit::compute_edit;
use crate::position::Position;

/// Default number of undo levels.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A single splice that can be undone/redone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    /// Byte offset where the splice starts.
    pub position: usize,
    pub deleted: String,
    pub inserted: String,
}

impl EditOperation {
    /// Computes the splice turning `old` into `new`, if they differ.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        match compute_edit(old, new) {
            Ok(Some(edit)) => Some(Self {
                position: edit.start_index,
                deleted: old[edit.start_index..edit.old_end_index].to_string(),
                inserted: new[edit.start_index..edit.new_end_index].to_string(),
            }),
            Ok(None) => None,
            Err(e) => {
                log::warn!("recording whole-buffer replacement: {}", e);
                Some(Self {
                    position: 0,
                    deleted: old.to_string(),
                    inserted: new.to_string(),
                })
            }
        }
    }

    /// Returns the inverse operation (for undo).
    pub fn inverse(&self) -> EditOperation {
        EditOperation {
            position: self.position,
            deleted: self.inserted.clone(),
            inserted: self.deleted.clone(),
        }
    }

    /// Applies the splice to `content`. Returns `None` if the content does
    /// not hold the expected text at `position`.
    pub fn apply(&self, content: &str) -> Option<String> {
        let end = self.position + self.deleted.len();
        if content.get(self.position..end)? != self.deleted {
            return None;
        }
        let mut out = String::with_capacity(content.len() + self.inserted.len());
        out.push_str(&content[..self.position]);
        out.push_str(&self.inserted);
        out.push_str(&content[end..]);
        Some(out)
    }
}

/// Applies operations in order, stopping at the first that does not fit.
pub fn apply_operations(content: &str, ops: &[EditOperation]) -> Option<String> {
    let mut text = content.to_string();
    for op in ops {
        text = op.apply(&text)?;
    }
    Some(text)
}

/// A group of edit operations that should be undone/redone together.
#[derive(Debug, Clone)]
pub struct EditGroup {
    /// The operations in this group (in order of execution).
    pub operations: Vec<EditOperation>,
    pub cursor_before: Position,
    pub cursor_after: Position,
}

impl EditGroup {
    pub fn new(cursor_before: Position) -> Self {
        Self {
            operations: Vec::new(),
            cursor_before,
            cursor_after: cursor_before,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Manages undo/redo history.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<EditGroup>,
    redo_stack: Vec<EditGroup>,
    max_size: usize,
    /// Group being built by an open command or insert session.
    current_group: Option<EditGroup>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    /// Creates a new history with the given maximum size.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            current_group: None,
        }
    }

    /// Starts a new edit group, committing any open one.
    pub fn begin_edit(&mut self, cursor: Position) {
        if self.current_group.is_some() {
            self.commit_edit();
        }
        self.current_group = Some(EditGroup::new(cursor));
    }

    /// Whether a group is open.
    pub fn is_recording(&self) -> bool {
        self.current_group.is_some()
    }

    /// Records an operation in the open group. Without an open group the
    /// operation becomes a group of its own.
    pub fn record(&mut self, op: EditOperation, cursor_before: Position) {
        match &mut self.current_group {
            Some(group) => group.operations.push(op),
            None => {
                let mut group = EditGroup::new(cursor_before);
                group.operations.push(op);
                self.current_group = Some(group);
            }
        }
    }

    /// Sets the cursor restored by redo.
    pub fn set_cursor_after(&mut self, cursor: Position) {
        if let Some(group) = &mut self.current_group {
            group.cursor_after = cursor;
        }
    }

    /// Commits the open edit group. Empty groups are dropped.
    pub fn commit_edit(&mut self) {
        if let Some(group) = self.current_group.take() {
            if !group.is_empty() {
                self.push_undo(group);
            }
        }
    }

    fn push_undo(&mut self, group: EditGroup) {
        self.undo_stack.push(group);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Returns true if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.current_group.as_ref().is_some_and(|g| !g.is_empty())
    }

    /// Returns true if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Pops the last edit group for undo.
    /// Returns the operations to apply and the cursor to restore.
    pub fn undo(&mut self) -> Option<(Vec<EditOperation>, Position)> {
        self.commit_edit();

        self.undo_stack.pop().map(|group| {
            let cursor = group.cursor_before;
            let ops: Vec<EditOperation> = group
                .operations
                .iter()
                .rev()
                .map(|op| op.inverse())
                .collect();
            self.redo_stack.push(group);
            (ops, cursor)
        })
    }

    /// Pops the last undone edit group for redo.
    pub fn redo(&mut self) -> Option<(Vec<EditOperation>, Position)> {
        self.redo_stack.pop().map(|group| {
            let cursor = group.cursor_after;
            let ops = group.operations.clone();
            self.undo_stack.push(group);
            (ops, cursor)
        })
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_group = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(old: &str, new: &str) -> EditOperation {
        EditOperation::between(old, new).unwrap()
    }

    #[test]
    fn test_between_and_inverse() {
        let edit = op("hello world", "hello there world");
        assert_eq!(edit.position, 6);
        assert_eq!(edit.deleted, "");
        assert_eq!(edit.inserted, "there ");
        assert_eq!(edit.apply("hello world").unwrap(), "hello there world");
        assert_eq!(edit.inverse().apply("hello there world").unwrap(), "hello world");
        assert_eq!(EditOperation::between("same", "same"), None);
    }

    #[test]
    fn test_apply_rejects_mismatched_content() {
        let edit = op("abc", "aXc");
        assert_eq!(edit.apply("zzz"), None);
        assert_eq!(edit.apply("a"), None);
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(100);
        let before = Position::origin();
        let after = Position::new(0, 5, 5);

        history.begin_edit(before);
        history.record(op("", "hello"), before);
        history.set_cursor_after(after);
        history.commit_edit();

        assert!(history.can_undo());
        assert!(!history.can_redo());

        let (ops, cursor) = history.undo().unwrap();
        assert_eq!(cursor, before);
        assert_eq!(apply_operations("hello", &ops).unwrap(), "");

        assert!(!history.can_undo());
        assert!(history.can_redo());

        let (ops, cursor) = history.redo().unwrap();
        assert_eq!(cursor, after);
        assert_eq!(apply_operations("", &ops).unwrap(), "hello");
    }

    #[test]
    fn test_group_undoes_in_reverse_order() {
        let mut history = History::default();
        history.begin_edit(Position::origin());
        history.record(op("", "a"), Position::origin());
        history.record(op("a", "ab"), Position::origin());
        history.record(op("ab", "ab\nc"), Position::origin());
        history.commit_edit();

        assert_eq!(history.undo_depth(), 1);
        let (ops, _) = history.undo().unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(apply_operations("ab\nc", &ops).unwrap(), "");
    }

    #[test]
    fn test_redo_cleared_on_new_edit() {
        let mut history = History::new(100);
        history.record(op("", "a"), Position::origin());
        history.commit_edit();

        history.undo();
        assert!(history.can_redo());

        history.record(op("", "b"), Position::origin());
        history.commit_edit();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(2);
        for text in ["a", "ab", "abc"] {
            let old = &text[..text.len() - 1];
            history.record(op(old, text), Position::origin());
            history.commit_edit();
        }
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let mut history = History::new(10);
        history.begin_edit(Position::origin());
        history.commit_edit();
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
    }
}
