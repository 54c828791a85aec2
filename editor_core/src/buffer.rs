//! Text buffer implementation using ropey.

use ropey::Rope;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use crate::context::EditorContext;
use crate::edit::compute_edit;
use crate::position::{char_index, Position};

/// Default indentation width for new buffers.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// A rope-backed buffer with a cursor, usable as an [`EditorContext`].
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    cursor: Position,
    tab_size: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self::from_str("")
    }

    /// Creates a text buffer from a string.
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Position::origin(),
            tab_size: DEFAULT_TAB_SIZE,
        }
    }

    /// Loads a text buffer from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let rope = Rope::from_reader(reader)?;
        Ok(Self {
            rope,
            cursor: Position::origin(),
            tab_size: DEFAULT_TAB_SIZE,
        })
    }

    /// Saves the buffer to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.rope.write_to(&mut writer)?;
        Ok(())
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.tab_size = tab_size;
    }

    /// Returns the total number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the total number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the entire buffer as a string.
    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }

    /// Replaces the content, touching only the region that differs.
    fn replace_content(&mut self, text: &str) {
        let old = self.rope.to_string();
        match compute_edit(&old, text) {
            Ok(None) => {}
            Ok(Some(edit)) => {
                let start = char_index(&old, edit.start_index);
                let old_end = char_index(&old, edit.old_end_index);
                if start < old_end {
                    self.rope.remove(start..old_end);
                }
                self.rope.insert(start, &text[edit.start_index..edit.new_end_index]);
            }
            Err(e) => {
                log::warn!("replacing whole buffer: {}", e);
                self.rope = Rope::from_str(text);
            }
        }
    }
}

impl EditorContext for TextBuffer {
    fn content(&self) -> String {
        self.rope.to_string()
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn tab_size(&self) -> usize {
        self.tab_size
    }

    fn update_content(&mut self, text: &str) {
        self.replace_content(text);
        // Keep the cursor inside the new content.
        let offset = self.cursor.offset.min(self.len_chars());
        let line = self.rope.char_to_line(offset);
        self.cursor = Position::new(line, offset - self.rope.line_to_char(line), offset);
    }

    fn set_cursor_position(&mut self, position: Position) {
        self.cursor = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buf = TextBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len_chars(), 0);
        assert_eq!(buf.len_lines(), 1);
        assert_eq!(buf.tab_size(), DEFAULT_TAB_SIZE);
    }

    #[test]
    fn test_line_operations() {
        let buf = TextBuffer::from_str("line1\nline2\n");
        assert_eq!(buf.len_lines(), 3);
        assert_eq!(buf.lines(), vec!["line1", "line2", ""]);
    }

    #[test]
    fn test_only_newline_breaks_lines() {
        let mut buf = TextBuffer::from_str("a\u{2028}b\rc\u{85}d\nend");
        assert_eq!(buf.len_lines(), 2);
        assert_eq!(buf.len_lines(), buf.lines().len());

        buf.set_cursor_position(Position::new(0, 6, 6));
        buf.update_content("a\u{2028}b\rc\u{85}d\r\nend");
        assert_eq!(buf.cursor(), Position::new(0, 6, 6));
        buf.set_cursor_position(Position::new(1, 1, 9));
        buf.update_content("x\ry\nz");
        assert_eq!(buf.cursor(), Position::new(1, 1, 5));
    }

    #[test]
    fn test_update_content_applies_minimal_edit() {
        let mut buf = TextBuffer::from_str("héllo world");
        buf.update_content("héllo brave world");
        assert_eq!(buf.to_string(), "héllo brave world");
        buf.update_content("");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_update_content_clamps_cursor() {
        let mut buf = TextBuffer::from_str("abc\ndef");
        buf.set_cursor_position(Position::new(1, 2, 6));
        buf.update_content("ab");
        assert_eq!(buf.cursor(), Position::new(0, 2, 2));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("modal_edit_buffer_test.txt");
        let buf = TextBuffer::from_str("one\ntwo\n");
        buf.save_to_file(&path).unwrap();
        let loaded = TextBuffer::from_file(&path).unwrap();
        assert_eq!(loaded.to_string(), "one\ntwo\n");
        let _ = fs::remove_file(&path);
    }
}
