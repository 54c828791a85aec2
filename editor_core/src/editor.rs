//! Per-buffer editing session.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::buffer::TextBuffer;
use crate::cadence::KeystrokeCadence;
use crate::config::EngineConfig;
use crate::context::EditorContext;
use crate::history::{apply_operations, EditOperation, History};
use crate::key::Key;
use crate::modal::{KeyEnv, KeyOutcome, ModalEngine};
use crate::mode::Mode;
use crate::position::Position;
use crate::register::{Register, UnnamedRegister};
use crate::scheduler::TokenizationScheduler;
use crate::search::Search;
use crate::syntax::{Language, LineTokens, ReparseKind, SyntaxSession};
use crate::viewport::{ViewportRange, ViewportTracker};

/// One open buffer with all of its editing state.
///
/// Nothing here is shared between buffers: two editors never see each
/// other's pending operator, history, debounce timer or viewport.
///
/// Note: does not derive Debug because the register is a trait object.
pub struct Editor {
    buffer: TextBuffer,
    register: Box<dyn Register>,
    engine: ModalEngine,
    history: History,
    search: Search,
    scheduler: TokenizationScheduler,
    cadence: KeystrokeCadence,
    viewport: ViewportTracker,
    syntax: SyntaxSession,
    /// Content the syntax tree was last synced to.
    parsed_source: String,
    file_path: Option<PathBuf>,
    modified: bool,
    config: EngineConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut buffer = TextBuffer::new();
        buffer.set_tab_size(config.tab_size);
        let mut search = Search::new();
        search.set_case_sensitive(config.search_case_sensitive);
        search.set_regex(config.search_regex);

        Self {
            buffer,
            register: Box::new(UnnamedRegister::new()),
            engine: ModalEngine::new(),
            history: History::new(config.history_capacity),
            search,
            scheduler: TokenizationScheduler::new(config.scheduler),
            cadence: KeystrokeCadence::new(),
            viewport: ViewportTracker::new(config.viewport),
            syntax: SyntaxSession::new(),
            parsed_source: String::new(),
            file_path: None,
            modified: false,
            config,
        }
    }

    /// Creates an unnamed editor holding `text`.
    pub fn from_str(text: &str, config: EngineConfig) -> Self {
        let mut editor = Self::with_config(config);
        editor.load_buffer(TextBuffer::from_str(text));
        editor
    }

    /// Opens a file, replacing the current buffer.
    pub fn open_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let buffer = TextBuffer::from_file(path)?;
        self.file_path = Some(path.to_path_buf());
        self.load_buffer(buffer);
        self.set_language(Language::from_path(path));
        log::info!(
            "opened {} ({} lines, {})",
            path.display(),
            self.buffer.len_lines(),
            self.syntax.language().name()
        );
        Ok(())
    }

    fn load_buffer(&mut self, mut buffer: TextBuffer) {
        buffer.set_tab_size(self.config.tab_size);
        self.buffer = buffer;
        self.engine = ModalEngine::new();
        self.history.clear();
        self.scheduler.cancel();
        self.viewport.reset();
        self.search.refresh(&self.buffer.content());
        self.modified = false;
        self.reparse_syntax();
    }

    /// Saves the buffer to the current file path.
    pub fn save(&mut self) -> io::Result<()> {
        if let Some(path) = &self.file_path {
            self.buffer.save_to_file(path)?;
            self.modified = false;
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "No file path set"))
        }
    }

    /// Saves the buffer to a new file path.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        self.buffer.save_to_file(path)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Returns whether the buffer has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn content(&self) -> String {
        self.buffer.content()
    }

    pub fn cursor(&self) -> Position {
        self.buffer.cursor()
    }

    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    pub fn engine(&self) -> &ModalEngine {
        &self.engine
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn scheduler(&self) -> &TokenizationScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces where deleted and yanked text goes.
    pub fn set_register(&mut self, register: Box<dyn Register>) {
        self.register = register;
    }

    // ==================== Keys ====================

    /// Runs one key through the modal engine and records any change.
    ///
    /// Content changes are grouped into one undo step per command; an insert
    /// session is a single step ending at `<Esc>`.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> KeyOutcome {
        self.cadence.record(now);
        let before = self.buffer.content();
        let cursor_before = self.buffer.cursor();

        let env = KeyEnv {
            viewport: self.viewport.geometry(),
            search_matches: self.search.matches(),
        };
        let outcome =
            self.engine
                .handle_key(key, &mut self.buffer, self.register.as_mut(), &env);

        if matches!(outcome, KeyOutcome::Undo | KeyOutcome::Redo) {
            self.history.commit_edit();
            let restored = if outcome == KeyOutcome::Undo {
                self.undo()
            } else {
                self.redo()
            };
            if restored {
                let content = self.buffer.content();
                self.content_changed(&content, now);
            }
            return outcome;
        }
        match &outcome {
            KeyOutcome::Search(pattern) => self.run_search(pattern),
            KeyOutcome::ExCommand(command) => self.ex_command(command),
            _ => {}
        }

        let after = self.buffer.content();
        if let Some(op) = EditOperation::between(&before, &after) {
            self.history.record(op, cursor_before);
            self.content_changed(&after, now);
        }
        self.history.set_cursor_after(self.buffer.cursor());
        if !self.engine.mode().is_insert() {
            self.history.commit_edit();
        }
        outcome
    }

    /// Feeds a key script such as `"dw3jA;<Esc>"`, all at `now`.
    pub fn feed(&mut self, script: &str, now: Instant) -> Vec<KeyOutcome> {
        Key::parse_script(script)
            .into_iter()
            .map(|key| self.handle_key(key, now))
            .collect()
    }

    fn content_changed(&mut self, content: &str, now: Instant) {
        self.modified = true;
        self.search.refresh(content);
        self.scheduler
            .schedule(now, self.buffer.len_lines(), self.cadence.last_interval());
    }

    fn run_search(&mut self, pattern: &str) {
        let content = self.buffer.content();
        let count = if pattern.is_empty() {
            self.search.refresh(&content);
            self.search.match_count()
        } else {
            self.search.set_query(pattern, &content)
        };
        log::debug!("/{}: {} matches", self.search.query(), count);

        if let Some(found) = self.search.next_after(self.buffer.cursor().offset) {
            self.buffer
                .set_cursor_position(Position::from_offset(&content, found.start));
        }
    }

    fn ex_command(&mut self, command: &str) {
        let result = match command {
            "w" | "write" => self.save(),
            "noh" | "nohlsearch" => {
                self.search.clear();
                Ok(())
            }
            _ => {
                log::info!("unknown command :{}", command);
                Ok(())
            }
        };
        if let Err(e) = result {
            log::warn!(":{} failed: {}", command, e);
        }
    }

    // ==================== History ====================

    /// Undoes the last change. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some((ops, cursor)) => self.restore(&ops, cursor),
            None => false,
        }
    }

    /// Redoes the last undone change.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some((ops, cursor)) => self.restore(&ops, cursor),
            None => false,
        }
    }

    fn restore(&mut self, ops: &[EditOperation], cursor: Position) -> bool {
        let content = self.buffer.content();
        let Some(restored) = apply_operations(&content, ops) else {
            log::warn!("history no longer matches the buffer; clearing it");
            self.history.clear();
            return false;
        };
        self.buffer.update_content(&restored);
        let offset = cursor.offset.min(self.buffer.len_chars());
        self.buffer
            .set_cursor_position(Position::from_offset(&restored, offset));
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Viewport & Syntax ====================

    /// Reports scroll state. Returns the padded line range when it moved
    /// enough to warrant retokenizing.
    pub fn scroll(
        &mut self,
        scroll_top: f32,
        visible_height: f32,
        line_height: f32,
    ) -> Option<ViewportRange> {
        self.viewport.update(
            scroll_top,
            visible_height,
            line_height,
            self.buffer.len_lines(),
        )
    }

    pub fn viewport(&self) -> Option<ViewportRange> {
        self.viewport.range()
    }

    pub fn language(&self) -> Language {
        self.syntax.language()
    }

    pub fn set_language(&mut self, language: Language) {
        self.syntax.set_language(language);
        self.reparse_syntax();
    }

    pub fn syntax(&self) -> &SyntaxSession {
        &self.syntax
    }

    fn reparse_syntax(&mut self) {
        self.parsed_source = self.buffer.content();
        self.syntax.parse(&self.parsed_source);
    }

    /// Runs the debounced re-sync once its deadline has passed.
    ///
    /// Returns how the tree was brought up to date, or `None` when nothing
    /// was due.
    pub fn tick(&mut self, now: Instant) -> Option<ReparseKind> {
        if !self.scheduler.poll(now) {
            return None;
        }
        let source = self.buffer.content();
        let kind = self.syntax.resync(&self.parsed_source, &source);
        self.parsed_source = source;
        Some(kind)
    }

    /// Forces any pending re-sync to run now.
    pub fn flush(&mut self) -> Option<ReparseKind> {
        self.scheduler.deadline().and_then(|deadline| self.tick(deadline))
    }

    /// Tokens for the tracked viewport, or the whole buffer when no viewport
    /// was reported.
    pub fn tokens(&self) -> Vec<LineTokens> {
        let range = self
            .viewport
            .range()
            .unwrap_or_else(|| ViewportRange::whole(self.buffer.len_lines()));
        self.syntax.tokenize_lines(&self.parsed_source, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn editor(text: &str) -> Editor {
        Editor::from_str(text, EngineConfig::default())
    }

    #[test]
    fn test_command_is_one_undo_step() {
        let now = Instant::now();
        let mut ed = editor("one two three");
        ed.feed("2dw", now);
        assert_eq!(ed.content(), "three");
        assert!(ed.is_modified());

        assert!(ed.undo());
        assert_eq!(ed.content(), "one two three");
        assert_eq!(ed.cursor().offset, 0);
        assert!(ed.redo());
        assert_eq!(ed.content(), "three");
    }

    #[test]
    fn test_insert_session_is_one_undo_step() {
        let now = Instant::now();
        let mut ed = editor("ab");
        ed.feed("ixyz<Esc>", now);
        assert_eq!(ed.content(), "xyzab");
        ed.feed("u", now);
        assert_eq!(ed.content(), "ab");
        ed.feed("<C-r>", now);
        assert_eq!(ed.content(), "xyzab");
    }

    #[test]
    fn test_motion_does_not_touch_history() {
        let now = Instant::now();
        let mut ed = editor("a b c");
        ed.feed("wwb", now);
        assert!(!ed.can_undo());
        assert!(!ed.is_modified());
        assert!(!ed.scheduler().is_pending());
    }

    #[test]
    fn test_search_jumps_and_n_repeats() {
        let now = Instant::now();
        let mut ed = editor("foo bar foo baz foo");
        ed.feed("/foo<CR>", now);
        assert_eq!(ed.cursor().offset, 8);
        assert_eq!(ed.search().match_count(), 3);
        ed.feed("n", now);
        assert_eq!(ed.cursor().offset, 16);
    }

    #[test]
    fn test_edit_schedules_and_tick_resyncs() {
        let now = Instant::now();
        let mut ed = editor("fn main() {}");
        ed.set_language(Language::Rust);
        ed.feed("x", now);
        assert!(ed.scheduler().is_pending());
        assert_eq!(ed.tick(now), None);

        let later = now + Duration::from_millis(ed.config().scheduler.max_interval_ms + 100);
        assert_eq!(ed.tick(later), Some(ReparseKind::Incremental));
        assert!(!ed.scheduler().is_pending());
        assert_eq!(ed.tick(later), None);
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut ed = editor("x");
        assert!(ed.save().is_err());
    }

    #[test]
    fn test_tab_size_from_config() {
        let config = EngineConfig {
            tab_size: 2,
            ..EngineConfig::default()
        };
        let now = Instant::now();
        let mut ed = Editor::from_str("a", config);
        ed.feed(">>", now);
        assert_eq!(ed.content(), "  a");
    }
}
