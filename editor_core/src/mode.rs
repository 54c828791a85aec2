//! Editing modes.

use std::fmt;

/// The mode a buffer's modal engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Mode {
    /// Navigation and commands.
    #[default]
    Normal,
    /// Text entry.
    Insert,
    /// Character-wise selection.
    Visual,
    /// Typing an ex command (`:`) or search (`/`).
    CommandLine,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Visual => "VISUAL",
            Self::CommandLine => "COMMAND",
        }
    }

    /// Whether keys edit the buffer text directly.
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
