//! Operators: content transformations over a motion's range.
//!
//! Each operator is a pure function from a range and a [`Snapshot`] to an
//! [`OperatorOutcome`]. [`apply_outcome`] is the only place that writes to
//! the buffer and the register.

use crate::context::{EditorContext, Snapshot};
use crate::motion::VimRange;
use crate::position::{byte_index, char_len, first_non_blank, Position};
use crate::register::{Register, RegisterWrite};

/// A named operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Yank,
    Change,
    Indent,
    Outdent,
    /// Overwrite characters with the given one (`r`).
    Replace(char),
}

/// Result of running an operator against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorOutcome {
    /// New buffer content, or `None` when the content is untouched.
    pub content: Option<String>,
    pub cursor: Position,
    pub register: Option<RegisterWrite>,
}

impl Operator {
    /// Maps an operator key. `r` is handled by the caller since it takes an
    /// argument.
    pub fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'd' => Self::Delete,
            'y' => Self::Yank,
            'c' => Self::Change,
            '>' => Self::Indent,
            '<' => Self::Outdent,
            _ => return None,
        })
    }

    /// The key that doubles this operator into a current-line command.
    pub fn key(&self) -> char {
        match self {
            Self::Delete => 'd',
            Self::Yank => 'y',
            Self::Change => 'c',
            Self::Indent => '>',
            Self::Outdent => '<',
            Self::Replace(_) => 'r',
        }
    }

    /// Whether `.` can repeat the operator.
    pub fn repeatable(&self) -> bool {
        !matches!(self, Self::Yank)
    }

    pub fn enters_insert_mode(&self) -> bool {
        matches!(self, Self::Change)
    }

    /// Runs the operator. Returns `None` when nothing should change.
    pub fn apply(&self, range: &VimRange, snapshot: &Snapshot, count: usize) -> Option<OperatorOutcome> {
        if snapshot.is_empty() {
            return None;
        }
        match self {
            Self::Delete => delete(range, snapshot, false),
            Self::Change => delete(range, snapshot, true),
            Self::Yank => yank(range, snapshot),
            Self::Indent | Self::Outdent => {
                if !range.linewise {
                    log::warn!("{:?} needs a linewise range", self);
                    return None;
                }
                shift_lines(range, snapshot, *self == Self::Indent)
            }
            Self::Replace(fill) => {
                if range.linewise {
                    log::warn!("replace needs a character-wise range");
                    return None;
                }
                replace(range.normalized().0, snapshot, count.max(1), *fill)
            }
        }
    }
}

/// Applies an outcome to the buffer and register.
pub fn apply_outcome<C: EditorContext + ?Sized>(
    outcome: OperatorOutcome,
    ctx: &mut C,
    register: &mut dyn Register,
) {
    if let Some(content) = &outcome.content {
        ctx.update_content(content);
    }
    ctx.set_cursor_position(outcome.cursor);
    if let Some(write) = outcome.register {
        register.write(write);
    }
}

/// Character offsets `[start, end)` covered by a character-wise range.
fn char_span(range: &VimRange, snapshot: &Snapshot) -> (usize, usize) {
    let (start, end) = range.normalized();
    let end = end.offset + usize::from(range.inclusive);
    (start.offset, end.min(snapshot.len_chars()))
}

fn clamped_line_span(range: &VimRange, snapshot: &Snapshot) -> (usize, usize) {
    let last = snapshot.lines.len() - 1;
    let (first, end) = range.line_span();
    (first.min(last), end.min(last))
}

fn linewise_text(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn delete(range: &VimRange, snapshot: &Snapshot, change: bool) -> Option<OperatorOutcome> {
    if range.linewise {
        return Some(delete_lines(range, snapshot, change));
    }

    let (start, end) = char_span(range, snapshot);
    if start >= end {
        return None;
    }
    let content = &snapshot.content;
    let (start_byte, end_byte) = (byte_index(content, start), byte_index(content, end));
    let removed = content[start_byte..end_byte].to_string();

    let mut new_content = String::with_capacity(content.len() - removed.len());
    new_content.push_str(&content[..start_byte]);
    new_content.push_str(&content[end_byte..]);

    let cursor = Position::from_offset(&new_content, start);
    Some(OperatorOutcome {
        content: Some(new_content),
        cursor,
        register: Some(RegisterWrite::new(removed, false)),
    })
}

fn delete_lines(range: &VimRange, snapshot: &Snapshot, change: bool) -> OperatorOutcome {
    let (first, last) = clamped_line_span(range, snapshot);
    let removed = linewise_text(&snapshot.lines[first..=last]);

    let mut remaining: Vec<&str> = Vec::with_capacity(snapshot.lines.len());
    remaining.extend(snapshot.lines[..first].iter().map(String::as_str));
    if change {
        remaining.push("");
    }
    remaining.extend(snapshot.lines[last + 1..].iter().map(String::as_str));

    let register = Some(RegisterWrite::new(removed, true));
    if remaining.is_empty() {
        return OperatorOutcome {
            content: Some(String::new()),
            cursor: Position::origin(),
            register,
        };
    }

    let new_content = remaining.join("\n");
    let line = first.min(remaining.len() - 1);
    let offset: usize = remaining[..line].iter().map(|l| char_len(l) + 1).sum();
    OperatorOutcome {
        content: Some(new_content),
        cursor: Position::new(line, 0, offset),
        register,
    }
}

fn yank(range: &VimRange, snapshot: &Snapshot) -> Option<OperatorOutcome> {
    let (start, _) = range.normalized();
    let write = if range.linewise {
        let (first, last) = clamped_line_span(range, snapshot);
        RegisterWrite::new(linewise_text(&snapshot.lines[first..=last]), true)
    } else {
        let (from, to) = char_span(range, snapshot);
        if from >= to {
            return None;
        }
        let content = &snapshot.content;
        let text = &content[byte_index(content, from)..byte_index(content, to)];
        RegisterWrite::new(text, false)
    };
    Some(OperatorOutcome {
        content: None,
        cursor: start,
        register: Some(write),
    })
}

/// Strips one indentation level: a tab, or up to `tab_size` spaces.
fn outdent_line(line: &str, tab_size: usize) -> &str {
    if let Some(rest) = line.strip_prefix('\t') {
        return rest;
    }
    let spaces = line.chars().take(tab_size).take_while(|&c| c == ' ').count();
    &line[spaces..]
}

fn shift_lines(range: &VimRange, snapshot: &Snapshot, indent: bool) -> Option<OperatorOutcome> {
    let tab_size = snapshot.tab_size;
    if tab_size == 0 && indent {
        return None;
    }
    let (first, last) = clamped_line_span(range, snapshot);
    let pad = " ".repeat(tab_size);

    let mut changed = false;
    let lines: Vec<String> = snapshot
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i < first || i > last {
                return line.clone();
            }
            if indent {
                changed = true;
                format!("{}{}", pad, line)
            } else {
                let stripped = outdent_line(line, tab_size);
                changed |= stripped.len() != line.len();
                stripped.to_string()
            }
        })
        .collect();

    if !changed {
        return None;
    }
    let cursor = Position::from_line_column(first, first_non_blank(&lines[first]), &lines);
    Some(OperatorOutcome {
        content: Some(lines.join("\n")),
        cursor,
        register: None,
    })
}

fn replace(at: Position, snapshot: &Snapshot, count: usize, fill: char) -> Option<OperatorOutcome> {
    if at.offset >= snapshot.len_chars() {
        return None;
    }
    let line = &snapshot.lines[at.line];
    let remaining = char_len(line).saturating_sub(at.column);
    if remaining == 0 || count > remaining {
        return None;
    }

    let content = &snapshot.content;
    let start_byte = byte_index(content, at.offset);
    let end_byte = byte_index(content, at.offset + count);
    let overwritten = content[start_byte..end_byte].to_string();

    // A line break replaces the whole run with a single newline.
    let replacement: String = if fill == '\n' {
        "\n".to_string()
    } else {
        std::iter::repeat(fill).take(count).collect()
    };

    let mut new_content = String::with_capacity(content.len() + replacement.len());
    new_content.push_str(&content[..start_byte]);
    new_content.push_str(&replacement);
    new_content.push_str(&content[end_byte..]);

    let cursor_offset = if fill == '\n' {
        at.offset + 1
    } else {
        at.offset + count - 1
    };
    let cursor = Position::from_offset(&new_content, cursor_offset);
    Some(OperatorOutcome {
        content: Some(new_content),
        cursor,
        register: Some(RegisterWrite::new(overwritten, false)),
    })
}
