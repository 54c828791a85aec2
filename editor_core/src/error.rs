//! Error types reported by the engine.

use thiserror::Error;

/// Failure to compute an incremental edit between two snapshots.
///
/// Callers fall back to a full reparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("inconsistent edit region: start {start} past old end {old_end} or new end {new_end}")]
    InvalidRegion {
        start: usize,
        old_end: usize,
        new_end: usize,
    },
}
