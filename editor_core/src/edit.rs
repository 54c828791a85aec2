//! Minimal edit region between two versions of a buffer.
//!
//! Used to re-synchronize an incremental parse tree without a full reparse.
//! Indices are byte offsets and points use byte columns, matching the
//! conventions of tree-sitter's `InputEdit`.

use crate::error::EditError;
use crate::position::{byte_point_from_offset, Point};

/// Largest absolute length change (bytes) still considered a simple edit.
const SIMPLE_EDIT_MAX_DELTA: usize = 100;

/// Largest changed region (bytes) still considered a simple edit.
const SIMPLE_EDIT_MAX_REGION: usize = 1000;

/// The changed region between an old and a new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub start_index: usize,
    pub old_end_index: usize,
    pub new_end_index: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

/// Whether an edit favours incremental or full reparsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditComplexity {
    Simple,
    Complex,
}

impl Edit {
    /// Absolute change in content length, in bytes.
    pub fn length_delta(&self) -> usize {
        self.new_end_index.abs_diff(self.old_end_index)
    }

    /// Size of the changed region in bytes.
    pub fn region_len(&self) -> usize {
        self.old_end_index.max(self.new_end_index) - self.start_index
    }

    /// Classifies the edit. This is a performance heuristic only.
    pub fn complexity(&self) -> EditComplexity {
        if self.length_delta() <= SIMPLE_EDIT_MAX_DELTA
            && self.region_len() <= SIMPLE_EDIT_MAX_REGION
        {
            EditComplexity::Simple
        } else {
            EditComplexity::Complex
        }
    }

    pub fn is_simple(&self) -> bool {
        self.complexity() == EditComplexity::Simple
    }

    /// Converts to the tree-sitter representation.
    pub fn to_input_edit(&self) -> tree_sitter::InputEdit {
        tree_sitter::InputEdit {
            start_byte: self.start_index,
            old_end_byte: self.old_end_index,
            new_end_byte: self.new_end_index,
            start_position: to_ts_point(self.start_position),
            old_end_position: to_ts_point(self.old_end_position),
            new_end_position: to_ts_point(self.new_end_position),
        }
    }
}

fn to_ts_point(point: Point) -> tree_sitter::Point {
    tree_sitter::Point {
        row: point.row,
        column: point.column,
    }
}

/// Computes the edit turning `old` into `new`.
///
/// Returns `Ok(None)` when the contents are identical and an error when the
/// region would be inconsistent.
pub fn compute_edit(old: &str, new: &str) -> Result<Option<Edit>, EditError> {
    if old == new {
        return Ok(None);
    }

    let prefix = common_prefix_len(old, new);
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = common_suffix_len(old, new, max_suffix);

    let start_index = prefix;
    let old_end_index = old.len() - suffix;
    let new_end_index = new.len() - suffix;

    if start_index > old_end_index || start_index > new_end_index {
        return Err(EditError::InvalidRegion {
            start: start_index,
            old_end: old_end_index,
            new_end: new_end_index,
        });
    }

    Ok(Some(Edit {
        start_index,
        old_end_index,
        new_end_index,
        start_position: byte_point_from_offset(old, start_index),
        old_end_position: byte_point_from_offset(old, old_end_index),
        new_end_position: byte_point_from_offset(new, new_end_index),
    }))
}

/// Longest common prefix in bytes, backed off to a char boundary.
fn common_prefix_len(old: &str, new: &str) -> usize {
    let mut len = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    while !(old.is_char_boundary(len) && new.is_char_boundary(len)) {
        len -= 1;
    }
    len
}

/// Longest common suffix in bytes, at most `max` long and on a char boundary.
fn common_suffix_len(old: &str, new: &str, max: usize) -> usize {
    let mut len = old
        .bytes()
        .rev()
        .zip(new.bytes().rev())
        .take(max)
        .take_while(|(a, b)| a == b)
        .count();
    while !(old.is_char_boundary(old.len() - len) && new.is_char_boundary(new.len() - len)) {
        len -= 1;
    }
    len
}
