//! Input handling - key reading and translation

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Key modifier flags
pub mod key_flags {
    pub const CONTROL: u32 = 0x1000_0000;
    pub const META: u32 = 0x2000_0000;
    pub const CTLX: u32 = 0x4000_0000;
    pub const SPEC: u32 = 0x8000_0000;
    /// C-c prefix (mode-specific commands)
    pub const CTLC: u32 = 0x0800_0000;
}

/// Special key codes
pub mod special {
    pub const HOME: u32 = 0x47;
    pub const UP: u32 = 0x48;
    pub const PAGE_UP: u32 = 0x49;
    pub const END: u32 = 0x4f;
    pub const DOWN: u32 = 0x50;
    pub const PAGE_DOWN: u32 = 0x51;
    /// F1 is 0x3b, F10 is 0x44
    pub const F1: u32 = 0x3b;
}

/// Represents a key input with modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u32);

impl Key {
    /// Create a key from a character
    pub fn char(ch: char) -> Self {
        Key(ch as u32)
    }

    /// Create a control key (C-x)
    pub fn ctrl(ch: char) -> Self {
        Key(key_flags::CONTROL | ch.to_ascii_lowercase() as u32)
    }

    /// Create a meta key (M-x or ESC x)
    pub fn meta(ch: char) -> Self {
        Key(key_flags::META | ch as u32)
    }

    /// Create a C-x C-x key
    pub fn ctlx_ctrl(ch: char) -> Self {
        Key(key_flags::CTLX | key_flags::CONTROL | ch.to_ascii_lowercase() as u32)
    }

    /// Create a C-c C-x key
    pub fn ctlc_ctrl(ch: char) -> Self {
        Key(key_flags::CTLC | key_flags::CONTROL | ch.to_ascii_lowercase() as u32)
    }

    /// Create a special key (function keys, etc.)
    pub fn special(code: u32) -> Self {
        Key(key_flags::SPEC | code)
    }

    /// Create a function key (F1..F12)
    pub fn function(n: u8) -> Self {
        Key::special(special::F1 + n as u32 - 1)
    }

    /// Get the raw key code
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Check if this is a control key
    pub fn is_ctrl(&self) -> bool {
        self.0 & key_flags::CONTROL != 0
    }

    /// Check if this is a meta key
    pub fn is_meta(&self) -> bool {
        self.0 & key_flags::META != 0
    }

    /// Check if this is a C-x prefixed key
    pub fn is_ctlx(&self) -> bool {
        self.0 & key_flags::CTLX != 0
    }

    /// Check if this is a C-c prefixed key
    pub fn is_ctlc(&self) -> bool {
        self.0 & key_flags::CTLC != 0
    }

    /// Check if this is a special key
    pub fn is_special(&self) -> bool {
        self.0 & key_flags::SPEC != 0
    }

    /// Get the base character (without modifiers)
    pub fn base_char(&self) -> Option<char> {
        char::from_u32(self.0 & 0x00FF_FFFF)
    }

    /// Convert key to a human-readable string (e.g., "M-n", "C-c C-e")
    pub fn display_name(&self) -> String {
        let mut result = String::new();

        if self.is_ctlx() {
            result.push_str("C-x ");
        }
        if self.is_ctlc() {
            result.push_str("C-c ");
        }
        if self.is_meta() {
            result.push_str("M-");
        }
        if self.is_ctrl() {
            result.push_str("C-");
        }

        if self.is_special() {
            let code = self.0 & 0xFF;
            let name = match code {
                special::HOME => "Home".to_string(),
                special::UP => "Up".to_string(),
                special::PAGE_UP => "PageUp".to_string(),
                special::END => "End".to_string(),
                special::DOWN => "Down".to_string(),
                special::PAGE_DOWN => "PageDown".to_string(),
                n if (special::F1..=special::F1 + 11).contains(&n) => format!("F{}", n - special::F1 + 1),
                n => format!("special-0x{:02x}", n),
            };
            result.push_str(&name);
            return result;
        }

        match self.base_char() {
            Some(' ') => result.push_str("SPC"),
            Some(ch) => result.push(ch),
            None => result.push('?'),
        }

        result
    }
}

/// Input state for handling multi-key sequences
#[derive(Debug, Default)]
pub struct InputState {
    /// Waiting for C-x continuation
    ctlx_pending: bool,
    /// Waiting for C-c continuation
    ctlc_pending: bool,
    /// Waiting for Meta continuation (after ESC)
    meta_pending: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset input state
    pub fn reset(&mut self) {
        self.ctlx_pending = false;
        self.ctlc_pending = false;
        self.meta_pending = false;
    }

    /// Check if waiting for continuation key
    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.ctlx_pending || self.ctlc_pending || self.meta_pending
    }

    /// Text shown while waiting for a continuation key
    pub fn pending_prompt(&self) -> Option<&'static str> {
        if self.ctlx_pending {
            Some("C-x -")
        } else if self.ctlc_pending {
            Some("C-c -")
        } else if self.meta_pending {
            Some("ESC -")
        } else {
            None
        }
    }

    /// Translate a crossterm KeyEvent to our Key representation
    pub fn translate_key(&mut self, event: KeyEvent) -> Option<Key> {
        let KeyEvent {
            code, modifiers, kind, ..
        } = event;

        // Only process key press events, ignore release and repeat
        if kind != KeyEventKind::Press {
            return None;
        }

        if self.meta_pending {
            self.meta_pending = false;
            return self.translate_normal(code, modifiers).map(|k| Key(k.0 | key_flags::META));
        }

        if self.ctlx_pending {
            self.ctlx_pending = false;
            return self.translate_normal(code, modifiers).map(|k| Key(k.0 | key_flags::CTLX));
        }

        if self.ctlc_pending {
            self.ctlc_pending = false;
            return self.translate_normal(code, modifiers).map(|k| Key(k.0 | key_flags::CTLC));
        }

        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            // A bare ESC starts a Meta sequence
            KeyCode::Esc => {
                self.meta_pending = true;
                None
            }
            KeyCode::Char('x') if ctrl => {
                self.ctlx_pending = true;
                None
            }
            KeyCode::Char('c') if ctrl => {
                self.ctlc_pending = true;
                None
            }
            _ => self.translate_normal(code, modifiers),
        }
    }

    fn translate_normal(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let alt = modifiers.contains(KeyModifiers::ALT);

        match code {
            KeyCode::Char(ch) => {
                if ctrl && alt {
                    Some(Key(key_flags::META | key_flags::CONTROL | ch.to_ascii_lowercase() as u32))
                } else if ctrl {
                    Some(Key::ctrl(ch))
                } else if alt {
                    Some(Key::meta(ch))
                } else {
                    Some(Key::char(ch))
                }
            }
            KeyCode::Enter => Some(Key::ctrl('m')),
            KeyCode::Home => Some(Key::special(special::HOME)),
            KeyCode::End => Some(Key::special(special::END)),
            KeyCode::PageUp => Some(Key::special(special::PAGE_UP)),
            KeyCode::PageDown => Some(Key::special(special::PAGE_DOWN)),
            KeyCode::Up => Some(Key::special(special::UP)),
            KeyCode::Down => Some(Key::special(special::DOWN)),
            KeyCode::F(n) if (1..=12).contains(&n) => Some(Key::function(n)),
            KeyCode::Esc => Some(Key::ctrl('[')),
            _ => None,
        }
    }
}
