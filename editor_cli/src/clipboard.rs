//! System clipboard as the unnamed register.

use modal_edit_core::{Register, RegisterWrite, UnnamedRegister};

/// Mirrors every register write to the system clipboard.
///
/// The clipboard is best effort: `arboard` can fail in headless sessions, in
/// which case writes still land in the in-memory register.
pub struct ClipboardRegister {
    clipboard: Option<arboard::Clipboard>,
    local: UnnamedRegister,
}

impl ClipboardRegister {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                log::warn!("clipboard unavailable: {}", e);
                None
            }
        };
        Self {
            clipboard,
            local: UnnamedRegister::new(),
        }
    }
}

impl Register for ClipboardRegister {
    fn write(&mut self, write: RegisterWrite) {
        if let Some(cb) = &mut self.clipboard {
            if let Err(e) = cb.set_text(write.content.clone()) {
                log::warn!("clipboard write failed: {}", e);
            }
        }
        self.local.write(write);
    }
}
