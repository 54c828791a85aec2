//! Key events fed to the modal engine.

/// A single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Backspace,
    /// A character typed with Control held, stored lowercase.
    Ctrl(char),
}

impl Key {
    /// Parses a key script such as `"dd3jx<Esc>:5<CR>"`.
    ///
    /// Recognized names are `<Esc>`, `<CR>`, `<Enter>`, `<BS>`, `<lt>` and
    /// `<C-x>`. An unrecognized `<...>` sequence is read as literal text.
    pub fn parse_script(script: &str) -> Vec<Key> {
        let mut keys = Vec::new();
        let mut rest = script;
        while let Some(c) = rest.chars().next() {
            if c == '<' {
                if let Some(end) = rest.find('>') {
                    if let Some(key) = Self::from_name(&rest[1..end]) {
                        keys.push(key);
                        rest = &rest[end + 1..];
                        continue;
                    }
                }
            }
            keys.push(match c {
                '\n' => Key::Enter,
                '\x1b' => Key::Escape,
                c => Key::Char(c),
            });
            rest = &rest[c.len_utf8()..];
        }
        keys
    }

    fn from_name(name: &str) -> Option<Key> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "esc" => Some(Key::Escape),
            "cr" | "enter" | "return" => Some(Key::Enter),
            "bs" => Some(Key::Backspace),
            "lt" => Some(Key::Char('<')),
            "space" => Some(Key::Char(' ')),
            _ => {
                let c = lower.strip_prefix("c-")?;
                let mut chars = c.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Ctrl(c)),
                    _ => None,
                }
            }
        }
    }
}
