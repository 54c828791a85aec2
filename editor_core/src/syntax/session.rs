//! Incremental parse state for one buffer.

use tree_sitter::{Node, Parser, Tree, TreeCursor};

use super::language::Language;
use super::token::{classify, LineTokens, TokenKind, TokenSpan};
use crate::edit::compute_edit;
use crate::viewport::ViewportRange;

/// How a re-sync brought the tree up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparseKind {
    /// Content was identical; the tree is untouched.
    Unchanged,
    /// The edit was applied to the old tree and reparsed incrementally.
    Incremental,
    Full,
    /// The language has no grammar.
    Skipped,
}

/// Parser and tree for one buffer.
pub struct SyntaxSession {
    parser: Parser,
    tree: Option<Tree>,
    language: Language,
}

impl Default for SyntaxSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyntaxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxSession")
            .field("language", &self.language)
            .field("has_tree", &self.tree.is_some())
            .finish()
    }
}

impl SyntaxSession {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            tree: None,
            language: Language::PlainText,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches grammar. The tree is dropped; call [`parse`](Self::parse)
    /// afterwards.
    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.tree = None;
        self.language = language;
        if let Some(grammar) = language.grammar() {
            if let Err(e) = self.parser.set_language(&grammar) {
                log::warn!("{} grammar unavailable: {}", language.name(), e);
                self.language = Language::PlainText;
            }
        }
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Full parse of `source`.
    pub fn parse(&mut self, source: &str) -> ReparseKind {
        if !self.language.is_parsed() {
            self.tree = None;
            return ReparseKind::Skipped;
        }
        self.tree = self.parser.parse(source, None);
        if self.tree.is_none() {
            log::warn!("{} parse produced no tree", self.language.name());
        }
        ReparseKind::Full
    }

    /// Brings the tree from `old` to `new`. Simple edits are applied
    /// incrementally; anything else falls back to a full parse.
    pub fn resync(&mut self, old: &str, new: &str) -> ReparseKind {
        if !self.language.is_parsed() {
            return ReparseKind::Skipped;
        }

        let edit = match compute_edit(old, new) {
            Ok(None) if self.tree.is_some() => return ReparseKind::Unchanged,
            Ok(edit) => edit,
            Err(e) => {
                log::warn!("falling back to full reparse: {}", e);
                None
            }
        };

        match (edit, self.tree.take()) {
            (Some(edit), Some(mut tree)) if edit.is_simple() => {
                tree.edit(&edit.to_input_edit());
                self.tree = self.parser.parse(new, Some(&tree));
                log::debug!(
                    "incremental reparse of bytes {}..{}",
                    edit.start_index,
                    edit.new_end_index
                );
                ReparseKind::Incremental
            }
            _ => {
                log::debug!("full reparse of {} bytes", new.len());
                self.parse(new)
            }
        }
    }

    /// Classified tokens for the lines of `range`, walking only the part of
    /// the tree that overlaps them.
    pub fn tokenize_lines(&self, source: &str, range: ViewportRange) -> Vec<LineTokens> {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let last = line_starts.len() - 1;
        if range.start_line > last {
            return Vec::new();
        }
        let first = range.start_line;
        let end_line = range.end_line.min(last);

        let mut lines: Vec<LineTokens> = (first..=end_line)
            .map(|line| LineTokens {
                line,
                spans: Vec::new(),
            })
            .collect();

        let Some(tree) = &self.tree else {
            return lines;
        };

        let line_end = |row: usize| {
            line_starts
                .get(row + 1)
                .map(|&s| s - 1)
                .unwrap_or(source.len())
        };
        let span_start = line_starts[first];
        let span_end = line_end(end_line);

        let mut nodes = Vec::new();
        let mut cursor = tree.walk();
        collect(&mut cursor, self.language, span_start, span_end, &mut nodes);

        for (node, kind) in nodes {
            let start_row = node.start_position().row.max(first);
            let end_row = node.end_position().row.min(end_line);
            for row in start_row..=end_row {
                let line_start = line_starts[row];
                let text = &source[line_start..line_end(row)];
                let from = node.start_byte().max(line_start) - line_start;
                let to = node.end_byte().min(line_start + text.len()) - line_start;
                if from < to {
                    lines[row - first].spans.push(TokenSpan {
                        start_col: text[..from].chars().count(),
                        end_col: text[..to].chars().count(),
                        kind,
                    });
                }
            }
        }
        for line in &mut lines {
            line.spans.sort_by_key(|s| s.start_col);
        }
        lines
    }
}

/// Collects classified nodes overlapping `[start, end)`. Children of a
/// classified node are not visited.
fn collect<'t>(
    cursor: &mut TreeCursor<'t>,
    language: Language,
    start: usize,
    end: usize,
    out: &mut Vec<(Node<'t>, TokenKind)>,
) {
    loop {
        let node = cursor.node();
        if node.end_byte() > start && node.start_byte() < end {
            if let Some(kind) = classify(&node, language) {
                out.push((node, kind));
            } else if cursor.goto_first_child() {
                collect(cursor, language, start, end, out);
                cursor.goto_parent();
            }
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "fn main() {\n    let x = 42;\n}";

    fn rust_session(source: &str) -> SyntaxSession {
        let mut session = SyntaxSession::new();
        session.set_language(Language::Rust);
        assert_eq!(session.parse(source), ReparseKind::Full);
        session
    }

    #[test]
    fn test_plain_text_is_skipped() {
        let mut session = SyntaxSession::new();
        assert_eq!(session.parse("hello"), ReparseKind::Skipped);
        assert_eq!(session.resync("hello", "help"), ReparseKind::Skipped);
        assert!(session.tree().is_none());
    }

    #[test]
    fn test_resync_kinds() {
        let mut session = rust_session(SOURCE);
        assert_eq!(session.resync(SOURCE, SOURCE), ReparseKind::Unchanged);

        let edited = "fn main() {\n    let x = 43;\n}";
        assert_eq!(session.resync(SOURCE, edited), ReparseKind::Incremental);

        let big = format!("{}\n// {}", edited, "x".repeat(2000));
        assert_eq!(session.resync(edited, &big), ReparseKind::Full);
        assert!(session.tree().is_some());
    }

    #[test]
    fn test_resync_without_tree_parses_fully() {
        let mut session = SyntaxSession::new();
        session.set_language(Language::Json);
        assert_eq!(session.resync("{}", "{}"), ReparseKind::Full);
        assert!(session.tree().is_some());
    }

    #[test]
    fn test_incremental_tree_matches_full_parse() {
        let mut session = rust_session(SOURCE);
        let edited = "fn main() {\n    let y = 42;\n    call();\n}";
        session.resync(SOURCE, edited);
        let incremental = session.tree().unwrap().root_node().to_sexp();

        let fresh = rust_session(edited);
        assert_eq!(incremental, fresh.tree().unwrap().root_node().to_sexp());
    }

    #[test]
    fn test_tokenize_lines() {
        let session = rust_session(SOURCE);
        let lines = session.tokenize_lines(SOURCE, ViewportRange::whole(3));
        assert_eq!(lines.len(), 3);

        assert_eq!(lines[0].kind_at(0), Some(TokenKind::Keyword));
        assert_eq!(lines[0].kind_at(3), Some(TokenKind::Function));
        assert_eq!(lines[1].kind_at(4), Some(TokenKind::Keyword));
        assert_eq!(lines[1].kind_at(12), Some(TokenKind::Number));
        assert_eq!(lines[1].kind_at(8), None);
    }

    #[test]
    fn test_tokenize_restricted_to_range() {
        let session = rust_session(SOURCE);
        let range = ViewportRange {
            start_line: 1,
            end_line: 1,
            total_lines: 3,
        };
        let lines = session.tokenize_lines(SOURCE, range);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line, 1);
        assert!(lines[0].spans.iter().all(|s| s.end_col <= 15));
        assert!(lines[0].spans.iter().any(|s| s.kind == TokenKind::Number));
    }

    #[test]
    fn test_tokenize_multibyte_columns() {
        let source = "let s = \"héllo\"; let n = 1;";
        let mut session = SyntaxSession::new();
        session.set_language(Language::Rust);
        let wrapped = format!("fn f() {{ {} }}", source);
        session.parse(&wrapped);
        let lines = session.tokenize_lines(&wrapped, ViewportRange::whole(1));
        let number = lines[0]
            .spans
            .iter()
            .find(|s| s.kind == TokenKind::Number)
            .unwrap();
        // Columns count chars, so the two-byte é does not shift them.
        let expected = wrapped.chars().position(|c| c == '1').unwrap();
        assert_eq!(number.start_col, expected);
    }

    #[test]
    fn test_tokenize_without_tree() {
        let session = SyntaxSession::new();
        let lines = session.tokenize_lines("a\nb", ViewportRange::whole(2));
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.spans.is_empty()));
    }
}
