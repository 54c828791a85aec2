//! Buffer search used by `/` and the `n`/`N` motions.

use regex::{Regex, RegexBuilder};

/// A search match in the buffer, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Start character position (inclusive).
    pub start: usize,
    /// End character position (exclusive).
    pub end: usize,
}

impl SearchMatch {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the match in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Search state for one buffer.
#[derive(Debug, Clone, Default)]
pub struct Search {
    query: String,
    matches: Vec<SearchMatch>,
    case_sensitive: bool,
    use_regex: bool,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current search query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sets the query and searches `content`. Returns the number of matches.
    pub fn set_query(&mut self, query: &str, content: &str) -> usize {
        self.query = query.to_string();
        self.find_all(content)
    }

    pub fn set_case_sensitive(&mut self, sensitive: bool) {
        self.case_sensitive = sensitive;
    }

    /// Treat the query as a regular expression rather than literal text.
    pub fn set_regex(&mut self, use_regex: bool) {
        self.use_regex = use_regex;
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if the search has a non-empty query.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
    }

    /// First match starting after `offset`, wrapping around.
    pub fn next_after(&self, offset: usize) -> Option<SearchMatch> {
        self.matches
            .iter()
            .find(|m| m.start > offset)
            .or_else(|| self.matches.first())
            .copied()
    }

    /// Re-runs the current query after the buffer changed.
    pub fn refresh(&mut self, content: &str) {
        if self.is_active() {
            self.find_all(content);
        }
    }

    fn compile(&self) -> Option<Regex> {
        let pattern = if self.use_regex {
            self.query.clone()
        } else {
            regex::escape(&self.query)
        };
        match RegexBuilder::new(&pattern)
            .case_insensitive(!self.case_sensitive)
            .multi_line(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                log::debug!("invalid search pattern {:?}: {}", self.query, e);
                None
            }
        }
    }

    /// Finds all matches. An invalid pattern finds nothing.
    fn find_all(&mut self, content: &str) -> usize {
        self.matches.clear();
        if self.query.is_empty() {
            return 0;
        }
        let Some(re) = self.compile() else {
            return 0;
        };

        // Byte offsets from the regex become char offsets in one pass.
        let mut chars_seen = 0;
        let mut bytes_seen = 0;
        let mut to_char = |byte: usize| {
            chars_seen += content[bytes_seen..byte].chars().count();
            bytes_seen = byte;
            chars_seen
        };
        for m in re.find_iter(content) {
            if m.start() == m.end() {
                continue;
            }
            let start = to_char(m.start());
            let end = to_char(m.end());
            self.matches.push(SearchMatch::new(start, end));
        }
        self.matches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_basic() {
        let mut search = Search::new();
        let count = search.set_query("hello", "hello world hello");
        assert_eq!(count, 2);
        assert_eq!(search.matches()[0], SearchMatch::new(0, 5));
        assert_eq!(search.matches()[1], SearchMatch::new(12, 17));
    }

    #[test]
    fn test_search_case_insensitive_by_default() {
        let mut search = Search::new();
        assert_eq!(search.set_query("hello", "Hello HELLO hello"), 3);
    }

    #[test]
    fn test_search_case_sensitive() {
        let mut search = Search::new();
        search.set_case_sensitive(true);
        assert_eq!(search.set_query("hello", "Hello HELLO hello"), 1);
    }

    #[test]
    fn test_literal_query_escapes_metacharacters() {
        let mut search = Search::new();
        assert_eq!(search.set_query("a.c", "abc a.c"), 1);
        assert_eq!(search.matches()[0].start, 4);
    }

    #[test]
    fn test_regex_query() {
        let mut search = Search::new();
        search.set_regex(true);
        assert_eq!(search.set_query(r"\d+", "a1 b22 c333"), 3);
        assert_eq!(search.matches()[2], SearchMatch::new(8, 11));
    }

    #[test]
    fn test_invalid_regex_finds_nothing() {
        let mut search = Search::new();
        search.set_regex(true);
        assert_eq!(search.set_query("(unclosed", "(unclosed"), 0);
        assert!(search.is_active());
    }

    #[test]
    fn test_matches_use_char_offsets() {
        let mut search = Search::new();
        search.set_query("ü", "aü bü");
        assert_eq!(search.matches(), &[SearchMatch::new(1, 2), SearchMatch::new(4, 5)]);
    }

    #[test]
    fn test_next_after_wraps() {
        let mut search = Search::new();
        search.set_query("a", "a b a c a");
        assert_eq!(search.next_after(4).unwrap().start, 8);
        assert_eq!(search.next_after(8).unwrap().start, 0);
    }

    #[test]
    fn test_refresh_after_change() {
        let mut search = Search::new();
        search.set_query("x", "x");
        search.refresh("x x x");
        assert_eq!(search.match_count(), 3);
    }
}
