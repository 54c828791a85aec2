//! Registers receiving text removed or copied by operators.

/// Text written to a register by a yank-producing operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterWrite {
    pub content: String,
    /// Whether the text holds whole lines.
    pub linewise: bool,
}

impl RegisterWrite {
    pub fn new(content: impl Into<String>, linewise: bool) -> Self {
        Self {
            content: content.into(),
            linewise,
        }
    }
}

/// Destination for register writes.
pub trait Register {
    fn write(&mut self, write: RegisterWrite);
}

/// In-memory unnamed register keeping the most recent write.
#[derive(Debug, Clone, Default)]
pub struct UnnamedRegister {
    last: Option<RegisterWrite>,
    writes: usize,
}

impl UnnamedRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent write, if any.
    pub fn contents(&self) -> Option<&RegisterWrite> {
        self.last.as_ref()
    }

    /// Number of writes received so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Register for UnnamedRegister {
    fn write(&mut self, write: RegisterWrite) {
        log::trace!(
            "register write: {} chars (linewise: {})",
            write.content.chars().count(),
            write.linewise
        );
        self.last = Some(write);
        self.writes += 1;
    }
}
