//! Syntax support.
//!
//! Keeps a tree-sitter tree in sync with the buffer through minimal edits
//! and classifies tokens for the visible lines.

mod language;
mod session;
mod token;

pub use language::Language;
pub use session::{ReparseKind, SyntaxSession};
pub use token::{LineTokens, TokenKind, TokenSpan};
