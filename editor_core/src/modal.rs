//! Modal command state machine.
//!
//! [`ModalEngine`] consumes one [`Key`] at a time. Counts, a pending
//! operator, the `g` prefix and `r` accumulate until a command is complete,
//! then the command runs against an [`EditorContext`]. Normal-mode grammar:
//!
//! ```text
//! [count] motion
//! [count] operator [count] motion      counts multiply: 2d3w deletes 6 words
//! [count] operator operator            current line: dd, 3>>
//! [count] x | D | C | r<char>
//! .  u  <C-r>
//! ```

use std::mem;

use crate::context::{EditorContext, Snapshot};
use crate::key::Key;
use crate::mode::Mode;
use crate::motion::{change_word_range, Motion, MotionMeta, VimRange};
use crate::operator::{apply_outcome, Operator, OperatorOutcome};
use crate::position::{
    byte_index, char_len, first_non_blank, last_line, line_len, offset_from_position, Position,
};
use crate::register::Register;
use crate::search::SearchMatch;
use crate::viewport::ViewportGeometry;

/// Counts above this are truncated.
const MAX_COUNT: usize = 99_999;

/// Collaborator state a key may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEnv<'a> {
    pub viewport: Option<ViewportGeometry>,
    pub search_matches: &'a [SearchMatch],
}

/// What a key did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Part of a longer command; nothing ran yet.
    Pending,
    Moved,
    Edited,
    ModeChanged(Mode),
    /// The host should undo the last change.
    Undo,
    /// The host should redo the last undone change.
    Redo,
    /// An ex command other than a line jump, without the leading `:`.
    ExCommand(String),
    /// A `/` search pattern. Empty means "repeat the last search".
    Search(String),
    /// Pending input was discarded.
    Cancelled,
    Ignored,
}

/// How a key enters Insert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertEntry {
    Before,
    After,
    LineStart,
    LineEnd,
    OpenBelow,
    OpenAbove,
}

impl InsertEntry {
    fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'i' => Self::Before,
            'a' => Self::After,
            'I' => Self::LineStart,
            'A' => Self::LineEnd,
            'o' => Self::OpenBelow,
            'O' => Self::OpenAbove,
            _ => return None,
        })
    }
}

/// A completed command `.` can replay.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Repeat {
    Operator {
        operator: Operator,
        motion: Motion,
        count: usize,
        explicit_count: bool,
        /// Text typed after a change, filled in when Insert mode ends.
        inserted: Option<String>,
    },
    Replace {
        fill: char,
        count: usize,
    },
    Insert {
        entry: InsertEntry,
        text: String,
    },
}

/// Per-buffer modal state.
#[derive(Debug, Clone, Default)]
pub struct ModalEngine {
    mode: Mode,
    /// Count typed before an operator or motion.
    count: Option<usize>,
    /// Count typed between an operator and its motion.
    operator_count: Option<usize>,
    pending_operator: Option<Operator>,
    pending_g: bool,
    awaiting_replace: bool,
    visual_anchor: Option<Position>,
    /// `:` or `/` while the command line is open.
    command_kind: Option<char>,
    command_line: String,
    /// Column kept across `j`/`k`; `usize::MAX` after `$`.
    preferred_column: Option<usize>,
    last_command: Option<Repeat>,
    /// Command whose insert session is being recorded for `.`.
    recording: Option<Repeat>,
    insert_text: String,
    replaying: bool,
}

impl ModalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether a partial command is waiting for more keys.
    pub fn has_pending(&self) -> bool {
        self.count.is_some()
            || self.operator_count.is_some()
            || self.pending_operator.is_some()
            || self.pending_g
            || self.awaiting_replace
    }

    pub fn pending_operator(&self) -> Option<Operator> {
        self.pending_operator
    }

    /// The command line being typed, prompt included.
    pub fn command_line(&self) -> Option<String> {
        self.command_kind
            .map(|kind| format!("{}{}", kind, self.command_line))
    }

    pub fn visual_anchor(&self) -> Option<Position> {
        self.visual_anchor
    }

    /// Whether `.` has something to repeat.
    pub fn can_repeat(&self) -> bool {
        self.last_command.is_some()
    }

    /// Processes one key.
    pub fn handle_key<C: EditorContext + ?Sized>(
        &mut self,
        key: Key,
        ctx: &mut C,
        register: &mut dyn Register,
        env: &KeyEnv<'_>,
    ) -> KeyOutcome {
        log::trace!("{} key {:?}", self.mode, key);
        match self.mode {
            Mode::Insert => self.insert_key(key, ctx, register),
            Mode::CommandLine => self.command_line_key(key, ctx),
            Mode::Normal | Mode::Visual => {
                let outcome = self.normal_key(key, ctx, register, env);
                if matches!(self.mode, Mode::Normal | Mode::Visual) {
                    clamp_cursor(ctx);
                }
                outcome
            }
        }
    }

    fn insert_key<C: EditorContext + ?Sized>(
        &mut self,
        key: Key,
        ctx: &mut C,
        register: &mut dyn Register,
    ) -> KeyOutcome {
        match key {
            Key::Escape => {
                self.finish_insert(ctx);
                KeyOutcome::ModeChanged(Mode::Normal)
            }
            Key::Char(c) => {
                self.insert_text.push(c);
                type_text(ctx, register, c.encode_utf8(&mut [0; 4]));
                KeyOutcome::Edited
            }
            Key::Enter => {
                self.insert_text.push('\n');
                type_text(ctx, register, "\n");
                KeyOutcome::Edited
            }
            Key::Backspace => {
                if backspace(ctx, register) {
                    self.insert_text.pop();
                    KeyOutcome::Edited
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::Ctrl(_) => KeyOutcome::Ignored,
        }
    }

    fn command_line_key<C: EditorContext + ?Sized>(&mut self, key: Key, ctx: &mut C) -> KeyOutcome {
        match key {
            Key::Escape => {
                self.close_command_line();
                KeyOutcome::ModeChanged(Mode::Normal)
            }
            Key::Backspace => {
                if self.command_line.pop().is_none() {
                    self.close_command_line();
                    KeyOutcome::ModeChanged(Mode::Normal)
                } else {
                    KeyOutcome::Pending
                }
            }
            Key::Char(c) => {
                self.command_line.push(c);
                KeyOutcome::Pending
            }
            Key::Enter => {
                let kind = self.command_kind;
                let text = mem::take(&mut self.command_line);
                self.close_command_line();
                match kind {
                    Some('/') => KeyOutcome::Search(text),
                    _ => self.ex_command(&text, ctx),
                }
            }
            Key::Ctrl(_) => KeyOutcome::Ignored,
        }
    }

    fn ex_command<C: EditorContext + ?Sized>(&mut self, text: &str, ctx: &mut C) -> KeyOutcome {
        let command = text.trim();
        if command.is_empty() {
            return KeyOutcome::Cancelled;
        }
        match command.parse::<usize>() {
            Ok(number) => {
                let lines = ctx.lines();
                let line = number.saturating_sub(1).min(last_line(&lines));
                let target = Position::from_line_column(line, first_non_blank(&lines[line]), &lines);
                ctx.set_cursor_position(target);
                self.preferred_column = None;
                KeyOutcome::Moved
            }
            Err(_) => {
                log::debug!("ex command :{}", command);
                KeyOutcome::ExCommand(command.to_string())
            }
        }
    }

    fn normal_key<C: EditorContext + ?Sized>(
        &mut self,
        key: Key,
        ctx: &mut C,
        register: &mut dyn Register,
        env: &KeyEnv<'_>,
    ) -> KeyOutcome {
        if key == Key::Escape {
            return self.escape();
        }

        if self.awaiting_replace {
            self.awaiting_replace = false;
            let fill = match key {
                Key::Char(c) => c,
                Key::Enter => '\n',
                _ => return self.cancel(),
            };
            let (count, _) = self.take_count();
            return self.run_replace(fill, count, ctx, register);
        }

        let Key::Char(c) = key else {
            if key == Key::Ctrl('r') && self.mode == Mode::Normal && !self.has_pending() {
                return KeyOutcome::Redo;
            }
            return self.cancel();
        };

        if self.pending_g {
            self.pending_g = false;
            if c == 'g' {
                return self.run_motion(Motion::FileStart, ctx, register, env);
            }
            return self.cancel();
        }

        if let Some(digit) = c.to_digit(10) {
            let slot = if self.pending_operator.is_some() {
                &mut self.operator_count
            } else {
                &mut self.count
            };
            // A leading zero is the line-start motion.
            if digit != 0 || slot.is_some() {
                let value = slot.unwrap_or(0).saturating_mul(10) + digit as usize;
                *slot = Some(value.min(MAX_COUNT));
                return KeyOutcome::Pending;
            }
        }

        if c == 'g' {
            self.pending_g = true;
            return KeyOutcome::Pending;
        }

        if let Some(op) = self.pending_operator {
            if c == op.key() {
                return self.run_motion(Motion::CurrentLine, ctx, register, env);
            }
            if let Some(motion) = Motion::from_key(c) {
                return self.run_motion(motion, ctx, register, env);
            }
            return self.cancel();
        }

        if let Some(motion) = Motion::from_key(c) {
            return self.run_motion(motion, ctx, register, env);
        }

        if let Some(op) = Operator::from_key(c) {
            if self.mode == Mode::Visual {
                return self.run_visual(op, ctx, register);
            }
            self.pending_operator = Some(op);
            return KeyOutcome::Pending;
        }

        if self.mode == Mode::Visual {
            return match c {
                'v' => {
                    self.clear_pending();
                    self.visual_anchor = None;
                    self.mode = Mode::Normal;
                    KeyOutcome::ModeChanged(Mode::Normal)
                }
                'x' => self.run_visual(Operator::Delete, ctx, register),
                ':' | '/' => self.open_command_line(c),
                _ => self.cancel(),
            };
        }

        match c {
            'x' => self.run_command(Operator::Delete, Motion::Right, ctx, register, env),
            'D' => self.run_command(Operator::Delete, Motion::LineEnd, ctx, register, env),
            'C' => self.run_command(Operator::Change, Motion::LineEnd, ctx, register, env),
            'r' => {
                self.awaiting_replace = true;
                KeyOutcome::Pending
            }
            'v' => {
                self.clear_pending();
                self.visual_anchor = Some(ctx.cursor());
                self.mode = Mode::Visual;
                KeyOutcome::ModeChanged(Mode::Visual)
            }
            ':' | '/' => self.open_command_line(c),
            '.' => self.repeat(ctx, register, env),
            'u' => {
                self.clear_pending();
                KeyOutcome::Undo
            }
            _ => match InsertEntry::from_key(c) {
                Some(entry) => {
                    self.clear_pending();
                    self.enter_insert(entry, ctx, register)
                }
                None => self.cancel(),
            },
        }
    }

    /// Runs a motion, or the pending operator over it.
    fn run_motion<C: EditorContext + ?Sized>(
        &mut self,
        motion: Motion,
        ctx: &mut C,
        register: &mut dyn Register,
        env: &KeyEnv<'_>,
    ) -> KeyOutcome {
        let (count, explicit_count) = self.take_count();
        if let Some(op) = self.pending_operator.take() {
            self.clear_pending();
            return self.run_operator(op, motion, count, explicit_count, ctx, register, env);
        }
        self.clear_pending();

        let cursor = ctx.cursor();
        let lines = ctx.lines();
        let preferred_column = if motion.is_vertical() {
            Some(*self.preferred_column.get_or_insert(cursor.column))
        } else {
            None
        };
        let meta = MotionMeta {
            explicit_count,
            operator_pending: false,
            preferred_column,
            viewport: env.viewport,
            search_matches: env.search_matches,
        };
        let range = motion.apply(cursor, &lines, count, &meta);
        if !motion.is_vertical() {
            self.preferred_column = (motion == Motion::LineEnd).then_some(usize::MAX);
        }
        ctx.set_cursor_position(range.target());
        KeyOutcome::Moved
    }

    /// `x`, `D` and `C`: an operator with a fixed motion.
    fn run_command<C: EditorContext + ?Sized>(
        &mut self,
        op: Operator,
        motion: Motion,
        ctx: &mut C,
        register: &mut dyn Register,
        env: &KeyEnv<'_>,
    ) -> KeyOutcome {
        let (count, explicit_count) = self.take_count();
        self.clear_pending();
        self.run_operator(op, motion, count, explicit_count, ctx, register, env)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_operator<C: EditorContext + ?Sized>(
        &mut self,
        op: Operator,
        motion: Motion,
        count: usize,
        explicit_count: bool,
        ctx: &mut C,
        register: &mut dyn Register,
        env: &KeyEnv<'_>,
    ) -> KeyOutcome {
        let snapshot = Snapshot::from_context(ctx);

        let meta = MotionMeta {
            explicit_count,
            operator_pending: true,
            preferred_column: None,
            viewport: env.viewport,
            search_matches: env.search_matches,
        };
        // `cw` on a non-blank changes to the end of the current word.
        let on_word = snapshot
            .content
            .chars()
            .nth(snapshot.cursor.offset)
            .is_some_and(|c| !c.is_whitespace());
        let range = if op == Operator::Change && motion == Motion::WordForward && on_word {
            change_word_range(snapshot.cursor, &snapshot.lines, count)
        } else {
            motion.apply(snapshot.cursor, &snapshot.lines, count, &meta)
        };
        log::debug!("{:?} over {:?} (count {})", op, motion, count);

        if motion.is_vertical() && !range.linewise {
            log::debug!("{:?} cannot move; {:?} not applied", motion, op);
            self.preferred_column = None;
            return KeyOutcome::Cancelled;
        }

        self.preferred_column = None;
        let repeat = Repeat::Operator {
            operator: op,
            motion,
            count,
            explicit_count,
            inserted: None,
        };

        let outcome = op.apply(&range, &snapshot, count);
        let ran = outcome.is_some();
        let edited = outcome.as_ref().is_some_and(|o| o.content.is_some());
        if let Some(outcome) = outcome {
            apply_outcome(outcome, ctx, register);
        }

        if op.enters_insert_mode() {
            self.begin_insert(Some(repeat));
            return KeyOutcome::ModeChanged(Mode::Insert);
        }
        if ran && op.repeatable() && !self.replaying {
            self.last_command = Some(repeat);
        }
        match (ran, edited) {
            (_, true) => KeyOutcome::Edited,
            (true, false) => KeyOutcome::Moved,
            (false, _) => KeyOutcome::Ignored,
        }
    }

    /// Applies an operator to the visual selection and leaves Visual mode.
    fn run_visual<C: EditorContext + ?Sized>(
        &mut self,
        op: Operator,
        ctx: &mut C,
        register: &mut dyn Register,
    ) -> KeyOutcome {
        self.clear_pending();
        let snapshot = Snapshot::from_context(ctx);
        let anchor = self.visual_anchor.take().unwrap_or(snapshot.cursor);
        let linewise = matches!(op, Operator::Indent | Operator::Outdent);
        let range = VimRange::new(anchor, snapshot.cursor, !linewise, linewise);
        self.mode = Mode::Normal;

        if let Some(outcome) = op.apply(&range, &snapshot, 1) {
            apply_outcome(outcome, ctx, register);
        }
        if op.enters_insert_mode() {
            self.begin_insert(None);
            return KeyOutcome::ModeChanged(Mode::Insert);
        }
        KeyOutcome::ModeChanged(Mode::Normal)
    }

    fn run_replace<C: EditorContext + ?Sized>(
        &mut self,
        fill: char,
        count: usize,
        ctx: &mut C,
        register: &mut dyn Register,
    ) -> KeyOutcome {
        let snapshot = Snapshot::from_context(ctx);
        let range = VimRange::at(snapshot.cursor);
        match Operator::Replace(fill).apply(&range, &snapshot, count) {
            Some(outcome) => {
                apply_outcome(outcome, ctx, register);
                if !self.replaying {
                    self.last_command = Some(Repeat::Replace { fill, count });
                }
                KeyOutcome::Edited
            }
            None => KeyOutcome::Ignored,
        }
    }

    fn enter_insert<C: EditorContext + ?Sized>(
        &mut self,
        entry: InsertEntry,
        ctx: &mut C,
        register: &mut dyn Register,
    ) -> KeyOutcome {
        self.preferred_column = None;
        let lines = ctx.lines();
        let cursor = ctx.cursor();
        let line = cursor.line.min(last_line(&lines));

        match entry {
            InsertEntry::Before => {}
            InsertEntry::After => {
                ctx.set_cursor_position(Position::from_line_column(line, cursor.column + 1, &lines));
            }
            InsertEntry::LineStart => {
                let column = first_non_blank(&lines[line]);
                ctx.set_cursor_position(Position::from_line_column(line, column, &lines));
            }
            InsertEntry::LineEnd => {
                let column = line_len(&lines, line);
                ctx.set_cursor_position(Position::from_line_column(line, column, &lines));
            }
            InsertEntry::OpenBelow => {
                let at = offset_from_position(line, line_len(&lines, line), &lines);
                splice(ctx, register, at, "\n", at + 1);
            }
            InsertEntry::OpenAbove => {
                let at = offset_from_position(line, 0, &lines);
                splice(ctx, register, at, "\n", at);
            }
        }

        self.begin_insert(Some(Repeat::Insert {
            entry,
            text: String::new(),
        }));
        KeyOutcome::ModeChanged(Mode::Insert)
    }

    fn begin_insert(&mut self, repeat: Option<Repeat>) {
        self.mode = Mode::Insert;
        self.insert_text.clear();
        self.recording = if self.replaying { None } else { repeat };
    }

    /// Leaves Insert mode, completing the command being recorded.
    fn finish_insert<C: EditorContext + ?Sized>(&mut self, ctx: &mut C) {
        let typed = mem::take(&mut self.insert_text);
        if let Some(mut command) = self.recording.take() {
            match &mut command {
                Repeat::Operator { inserted, .. } => *inserted = Some(typed),
                Repeat::Insert { text, .. } => *text = typed,
                Repeat::Replace { .. } => {}
            }
            self.last_command = Some(command);
        }
        self.mode = Mode::Normal;

        let cursor = ctx.cursor();
        if cursor.column > 0 {
            let lines = ctx.lines();
            ctx.set_cursor_position(Position::from_line_column(cursor.line, cursor.column - 1, &lines));
        }
    }

    /// Replays the last repeatable command. A typed count replaces the
    /// recorded one.
    fn repeat<C: EditorContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        register: &mut dyn Register,
        env: &KeyEnv<'_>,
    ) -> KeyOutcome {
        let (count, explicit) = self.take_count();
        self.clear_pending();
        let Some(command) = self.last_command.clone() else {
            return KeyOutcome::Ignored;
        };
        log::debug!("repeating {:?}", command);

        self.replaying = true;
        let outcome = match command {
            Repeat::Operator {
                operator,
                motion,
                count: recorded,
                explicit_count,
                inserted,
            } => {
                let (count, explicit_count) = if explicit {
                    (count, true)
                } else {
                    (recorded, explicit_count)
                };
                let outcome =
                    self.run_operator(operator, motion, count, explicit_count, ctx, register, env);
                if self.mode == Mode::Insert {
                    if let Some(text) = inserted {
                        type_text(ctx, register, &text);
                    }
                    self.finish_insert(ctx);
                    KeyOutcome::Edited
                } else {
                    outcome
                }
            }
            Repeat::Replace {
                fill,
                count: recorded,
            } => {
                let count = if explicit { count } else { recorded };
                self.run_replace(fill, count, ctx, register)
            }
            Repeat::Insert { entry, text } => {
                self.enter_insert(entry, ctx, register);
                type_text(ctx, register, &text);
                self.finish_insert(ctx);
                KeyOutcome::Edited
            }
        };
        self.replaying = false;
        outcome
    }

    fn open_command_line(&mut self, kind: char) -> KeyOutcome {
        self.clear_pending();
        self.visual_anchor = None;
        self.command_kind = Some(kind);
        self.command_line.clear();
        self.mode = Mode::CommandLine;
        KeyOutcome::ModeChanged(Mode::CommandLine)
    }

    fn close_command_line(&mut self) {
        self.command_kind = None;
        self.command_line.clear();
        self.mode = Mode::Normal;
    }

    fn escape(&mut self) -> KeyOutcome {
        let had_pending = self.has_pending();
        self.clear_pending();
        if self.mode == Mode::Visual {
            self.visual_anchor = None;
            self.mode = Mode::Normal;
            return KeyOutcome::ModeChanged(Mode::Normal);
        }
        if had_pending {
            KeyOutcome::Cancelled
        } else {
            KeyOutcome::Ignored
        }
    }

    fn cancel(&mut self) -> KeyOutcome {
        if self.has_pending() {
            log::trace!("discarding pending input");
            self.clear_pending();
            KeyOutcome::Cancelled
        } else {
            KeyOutcome::Ignored
        }
    }

    /// Total count and whether any count was typed.
    fn take_count(&mut self) -> (usize, bool) {
        let explicit = self.count.is_some() || self.operator_count.is_some();
        let count = self
            .count
            .take()
            .unwrap_or(1)
            .saturating_mul(self.operator_count.take().unwrap_or(1));
        (count.clamp(1, MAX_COUNT), explicit)
    }

    fn clear_pending(&mut self) {
        self.count = None;
        self.operator_count = None;
        self.pending_operator = None;
        self.pending_g = false;
        self.awaiting_replace = false;
    }
}

/// Keeps a Normal-mode cursor on a character rather than past the line end.
fn clamp_cursor<C: EditorContext + ?Sized>(ctx: &mut C) {
    let cursor = ctx.cursor();
    if cursor.column == 0 {
        return;
    }
    let lines = ctx.lines();
    let len = line_len(&lines, cursor.line);
    if len > 0 && cursor.column >= len {
        ctx.set_cursor_position(Position::from_line_column(cursor.line, len - 1, &lines));
    }
}

/// Inserts `text` at character offset `at` and moves the cursor.
fn splice<C: EditorContext + ?Sized>(
    ctx: &mut C,
    register: &mut dyn Register,
    at: usize,
    text: &str,
    cursor_offset: usize,
) {
    let content = ctx.content();
    let byte = byte_index(&content, at);
    let mut new_content = String::with_capacity(content.len() + text.len());
    new_content.push_str(&content[..byte]);
    new_content.push_str(text);
    new_content.push_str(&content[byte..]);
    let cursor = Position::from_offset(&new_content, cursor_offset);
    let outcome = OperatorOutcome {
        content: Some(new_content),
        cursor,
        register: None,
    };
    apply_outcome(outcome, ctx, register);
}

/// Inserts `text` at the cursor, leaving the cursor after it.
fn type_text<C: EditorContext + ?Sized>(ctx: &mut C, register: &mut dyn Register, text: &str) {
    if text.is_empty() {
        return;
    }
    let at = ctx.cursor().offset;
    splice(ctx, register, at, text, at + char_len(text));
}

/// Deletes the character before the cursor. Returns false at the buffer
/// start.
fn backspace<C: EditorContext + ?Sized>(ctx: &mut C, register: &mut dyn Register) -> bool {
    let offset = ctx.cursor().offset;
    if offset == 0 {
        return false;
    }
    let content = ctx.content();
    let start = byte_index(&content, offset - 1);
    let end = byte_index(&content, offset);
    let mut new_content = String::with_capacity(content.len());
    new_content.push_str(&content[..start]);
    new_content.push_str(&content[end..]);
    let cursor = Position::from_offset(&new_content, offset - 1);
    apply_outcome(
        OperatorOutcome {
            content: Some(new_content),
            cursor,
            register: None,
        },
        ctx,
        register,
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::register::UnnamedRegister;

    struct Harness {
        engine: ModalEngine,
        buffer: TextBuffer,
        register: UnnamedRegister,
    }

    impl Harness {
        fn new(text: &str) -> Self {
            Self {
                engine: ModalEngine::new(),
                buffer: TextBuffer::from_str(text),
                register: UnnamedRegister::new(),
            }
        }

        fn feed(&mut self, keys: &str) -> Vec<KeyOutcome> {
            let env = KeyEnv::default();
            Key::parse_script(keys)
                .into_iter()
                .map(|key| {
                    self.engine
                        .handle_key(key, &mut self.buffer, &mut self.register, &env)
                })
                .collect()
        }

        fn text(&self) -> String {
            self.buffer.to_string()
        }

        fn cursor(&self) -> (usize, usize) {
            let c = self.buffer.cursor();
            (c.line, c.column)
        }
    }

    #[test]
    fn test_dd_on_middle_line() {
        let mut h = Harness::new("a\nb\nc");
        let outcomes = h.feed("jdd");
        assert_eq!(outcomes, vec![KeyOutcome::Moved, KeyOutcome::Pending, KeyOutcome::Edited]);
        assert_eq!(h.text(), "a\nc");
        assert_eq!(h.cursor(), (1, 0));
        assert_eq!(h.register.contents().unwrap().content, "b\n");
    }

    #[test]
    fn test_counts_multiply() {
        let mut h = Harness::new("a b c d e f g h");
        h.feed("2d3w");
        assert_eq!(h.text(), "g h");
    }

    #[test]
    fn test_count_before_doubled_operator() {
        let mut h = Harness::new("a\nb\nc");
        h.feed("2>>");
        assert_eq!(h.text(), "    a\n    b\nc");
    }

    #[test]
    fn test_x_deletes_under_cursor() {
        let mut h = Harness::new("abc");
        h.feed("2x");
        assert_eq!(h.text(), "c");
        h.feed("x");
        assert_eq!(h.text(), "");
        assert_eq!(h.feed("x"), vec![KeyOutcome::Ignored]);
    }

    #[test]
    fn test_replace_with_count() {
        let mut h = Harness::new("abcdef");
        h.feed("3rx");
        assert_eq!(h.text(), "xxxdef");
        assert_eq!(h.cursor(), (0, 2));
    }

    #[test]
    fn test_change_word_enters_insert() {
        let mut h = Harness::new("bar baz");
        let outcomes = h.feed("cw");
        assert_eq!(outcomes[1], KeyOutcome::ModeChanged(Mode::Insert));
        h.feed("foo<Esc>");
        assert_eq!(h.text(), "foo baz");
        assert_eq!(h.engine.mode(), Mode::Normal);
        assert_eq!(h.cursor(), (0, 2));
    }

    #[test]
    fn test_change_word_stays_in_current_word() {
        let mut h = Harness::new("foo bar");
        h.feed("llcwX<Esc>");
        assert_eq!(h.text(), "foX bar");

        let mut h = Harness::new("a bc");
        h.feed("cwX<Esc>");
        assert_eq!(h.text(), "X bc");

        let mut h = Harness::new("one two three");
        h.feed("c2wX<Esc>");
        assert_eq!(h.text(), "X three");
    }

    #[test]
    fn test_vertical_operator_fails_at_buffer_edge() {
        let mut h = Harness::new("a\nb");
        assert_eq!(h.feed("jdj").last(), Some(&KeyOutcome::Cancelled));
        assert_eq!(h.text(), "a\nb");
        assert!(h.register.contents().is_none());

        h.feed("ggck");
        assert_eq!(h.text(), "a\nb");
        assert_eq!(h.engine.mode(), Mode::Normal);

        h.feed("dj");
        assert_eq!(h.text(), "");
    }

    #[test]
    fn test_dot_repeats_delete() {
        let mut h = Harness::new("a b c d");
        h.feed("dw.");
        assert_eq!(h.text(), "c d");
    }

    #[test]
    fn test_dot_repeats_change_with_text() {
        let mut h = Harness::new("aa bb cc");
        h.feed("cwx<Esc>w.");
        assert_eq!(h.text(), "x x cc");
    }

    #[test]
    fn test_dot_repeats_insert() {
        let mut h = Harness::new("");
        h.feed("ia<Esc>.");
        assert_eq!(h.text(), "aa");
    }

    #[test]
    fn test_dot_repeats_replace() {
        let mut h = Harness::new("abc");
        h.feed("rxl.");
        assert_eq!(h.text(), "xxc");
    }

    #[test]
    fn test_yank_is_not_repeated() {
        let mut h = Harness::new("abc");
        h.feed("xyy.");
        assert_eq!(h.text(), "c");
        assert_eq!(h.register.contents().unwrap().content, "b");
    }

    #[test]
    fn test_yank_line_keeps_content() {
        let mut h = Harness::new("one\ntwo");
        h.feed("yy");
        assert_eq!(h.text(), "one\ntwo");
        let write = h.register.contents().unwrap();
        assert_eq!(write.content, "one\n");
        assert!(write.linewise);
    }

    #[test]
    fn test_insert_mode_typing() {
        let mut h = Harness::new("");
        h.feed("ihello<Esc>");
        assert_eq!(h.text(), "hello");
        assert_eq!(h.cursor(), (0, 4));

        let mut h = Harness::new("");
        h.feed("iab<BS>c<CR>d<Esc>");
        assert_eq!(h.text(), "ac\nd");
    }

    #[test]
    fn test_append_and_open_lines() {
        let mut h = Harness::new("abc");
        h.feed("A!<Esc>");
        assert_eq!(h.text(), "abc!");

        let mut h = Harness::new("a\nb");
        h.feed("onew<Esc>");
        assert_eq!(h.text(), "a\nnew\nb");

        let mut h = Harness::new("a");
        h.feed("Otop<Esc>");
        assert_eq!(h.text(), "top\na");
    }

    #[test]
    fn test_visual_delete() {
        let mut h = Harness::new("abcd");
        let outcomes = h.feed("vld");
        assert_eq!(outcomes[0], KeyOutcome::ModeChanged(Mode::Visual));
        assert_eq!(h.text(), "cd");
        assert_eq!(h.engine.mode(), Mode::Normal);
    }

    #[test]
    fn test_visual_indent_is_linewise() {
        let mut h = Harness::new("a\nb\nc");
        h.feed("vj>");
        assert_eq!(h.text(), "    a\n    b\nc");
    }

    #[test]
    fn test_file_motions() {
        let mut h = Harness::new("a\nb\nc");
        h.feed("G");
        assert_eq!(h.cursor(), (2, 0));
        h.feed("gg");
        assert_eq!(h.cursor(), (0, 0));
        h.feed("2G");
        assert_eq!(h.cursor(), (1, 0));
    }

    #[test]
    fn test_preferred_column_after_dollar() {
        let mut h = Harness::new("abcd\nxy\nlonger");
        h.feed("$j");
        assert_eq!(h.cursor(), (1, 1));
        h.feed("j");
        assert_eq!(h.cursor(), (2, 5));
    }

    #[test]
    fn test_zero_is_motion_without_count() {
        let mut h = Harness::new("abcdefghijklmn");
        h.feed("10l");
        assert_eq!(h.cursor(), (0, 10));
        h.feed("0");
        assert_eq!(h.cursor(), (0, 0));
    }

    #[test]
    fn test_delete_to_line_end_clamps_cursor() {
        let mut h = Harness::new("hello");
        h.feed("llD");
        assert_eq!(h.text(), "he");
        assert_eq!(h.cursor(), (0, 1));
    }

    #[test]
    fn test_command_line() {
        let mut h = Harness::new("a\nb\nc");
        let outcomes = h.feed(":2<CR>");
        assert_eq!(outcomes.last(), Some(&KeyOutcome::Moved));
        assert_eq!(h.cursor(), (1, 0));

        assert_eq!(h.feed(":w<CR>").last(), Some(&KeyOutcome::ExCommand("w".into())));
        assert_eq!(h.feed("/b<CR>").last(), Some(&KeyOutcome::Search("b".into())));
        assert_eq!(h.engine.mode(), Mode::Normal);
    }

    #[test]
    fn test_command_line_backspace_and_escape() {
        let mut h = Harness::new("a");
        h.feed(":ab");
        assert_eq!(h.engine.command_line().as_deref(), Some(":ab"));
        h.feed("<BS><BS>");
        assert_eq!(h.engine.command_line().as_deref(), Some(":"));
        assert_eq!(h.feed("<BS>"), vec![KeyOutcome::ModeChanged(Mode::Normal)]);
        h.feed(":q<Esc>");
        assert_eq!(h.engine.mode(), Mode::Normal);
    }

    #[test]
    fn test_pending_input_cancelled() {
        let mut h = Harness::new("abc");
        assert_eq!(h.feed("d<Esc>"), vec![KeyOutcome::Pending, KeyOutcome::Cancelled]);
        assert!(!h.engine.has_pending());
        assert_eq!(h.feed("dz"), vec![KeyOutcome::Pending, KeyOutcome::Cancelled]);
        assert_eq!(h.text(), "abc");
        h.feed("x");
        assert_eq!(h.text(), "bc");
    }

    #[test]
    fn test_undo_redo_are_reported() {
        let mut h = Harness::new("abc");
        assert_eq!(h.feed("u<C-r>"), vec![KeyOutcome::Undo, KeyOutcome::Redo]);
    }

    #[test]
    fn test_search_motion_uses_env_matches() {
        let mut h = Harness::new("foo bar foo");
        let matches = [SearchMatch::new(0, 3), SearchMatch::new(8, 11)];
        let env = KeyEnv {
            viewport: None,
            search_matches: &matches,
        };
        h.engine
            .handle_key(Key::Char('n'), &mut h.buffer, &mut h.register, &env);
        assert_eq!(h.cursor(), (0, 8));
    }
}
