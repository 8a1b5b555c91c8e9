//! Command dispatch system
//!
//! This module provides the key binding table and command implementations.
//! Commands are organized into submodules by category.

mod errors;
mod misc;
mod navigation;

use std::collections::HashMap;

use crate::error::Result;
use crate::input::{special, Key};
use crate::viewer::ViewerState;

/// Command result status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
    Abort,
}

/// Command function signature
/// - viewer: mutable reference to viewer state
/// - f: true if numeric argument was provided
/// - n: numeric argument (repeat count, default 1)
pub type CommandFn = fn(&mut ViewerState, bool, i32) -> Result<CommandStatus>;

/// Key binding entry with command function and name
struct BindingEntry {
    function: CommandFn,
    name: &'static str,
}

/// Key binding table
pub struct KeyTable {
    bindings: HashMap<u32, BindingEntry>,
}

impl KeyTable {
    /// Create an empty key table
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create key table with default bindings
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.setup_defaults();
        table
    }

    /// Add a key binding with command name
    pub fn bind_named(&mut self, key: Key, cmd: CommandFn, name: &'static str) {
        self.bindings.insert(key.code(), BindingEntry { function: cmd, name });
    }

    /// Look up a command for a key
    pub fn lookup(&self, key: Key) -> Option<CommandFn> {
        self.bindings.get(&key.code()).map(|e| e.function)
    }

    /// Look up a command name for a key
    pub fn lookup_name(&self, key: Key) -> Option<&'static str> {
        self.bindings.get(&key.code()).map(|e| e.name)
    }

    /// Look up a command by name (returns first matching binding)
    pub fn lookup_by_name(&self, name: &str) -> Option<CommandFn> {
        self.bindings
            .values()
            .find(|entry| entry.name == name)
            .map(|entry| entry.function)
    }

    /// Shortest key bound to a command, for menu hints
    pub fn key_for(&self, name: &str) -> Option<Key> {
        self.bindings
            .iter()
            .filter(|(_, entry)| entry.name == name)
            .map(|(&code, _)| Key(code))
            .min_by_key(|key| (key.display_name().len(), key.code()))
    }

    /// Set up default key bindings
    fn setup_defaults(&mut self) {
        use errors::*;
        use misc::*;
        use navigation::*;

        // Cursor movement
        self.bind_named(Key::ctrl('n'), next_line, "next-line");
        self.bind_named(Key::ctrl('p'), previous_line, "previous-line");
        self.bind_named(Key::special(special::DOWN), next_line, "next-line");
        self.bind_named(Key::special(special::UP), previous_line, "previous-line");

        // Page movement
        self.bind_named(Key::ctrl('v'), scroll_down, "scroll-down");
        self.bind_named(Key::meta('v'), scroll_up, "scroll-up");
        self.bind_named(Key::special(special::PAGE_DOWN), scroll_down, "scroll-down");
        self.bind_named(Key::special(special::PAGE_UP), scroll_up, "scroll-up");
        self.bind_named(Key::meta('<'), beginning_of_buffer, "beginning-of-buffer");
        self.bind_named(Key::meta('>'), end_of_buffer, "end-of-buffer");
        self.bind_named(Key::special(special::HOME), beginning_of_buffer, "beginning-of-buffer");
        self.bind_named(Key::special(special::END), end_of_buffer, "end-of-buffer");

        // Screen refresh
        self.bind_named(Key::ctrl('l'), recenter, "recenter");
        self.bind_named(Key::char('#'), toggle_line_numbers, "toggle-line-numbers");

        // Error lines
        self.bind_named(Key::meta('n'), next_error, "next-error-line");
        self.bind_named(Key::meta('p'), previous_error, "previous-error-line");
        self.bind_named(Key::ctlc_ctrl('e'), list_errors, "list-error-lines");
        self.bind_named(Key::ctlc_ctrl('m'), toggle_error_mode, "error-highlight-mode");
        self.bind_named(Key::function(10), show_menu, "menu-bar-open");

        // File
        self.bind_named(Key::char('g'), revert_buffer, "revert-buffer");
        self.bind_named(Key::char('f'), toggle_follow, "auto-revert-tail-mode");

        // Quit
        self.bind_named(Key::ctlx_ctrl('c'), quit, "kill-viewer");
        self.bind_named(Key::char('q'), quit, "kill-viewer");

        // Abort
        self.bind_named(Key::ctrl('g'), abort, "keyboard-quit");
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::ModeCommand;

    #[test]
    fn test_default_bindings() {
        let table = KeyTable::with_defaults();
        assert_eq!(table.lookup_name(Key::meta('n')), Some("next-error-line"));
        assert_eq!(table.lookup_name(Key::ctlc_ctrl('e')), Some("list-error-lines"));
        assert_eq!(table.lookup_name(Key::special(special::DOWN)), Some("next-line"));
        assert!(table.lookup(Key::ctrl('z')).is_none());
    }

    #[test]
    fn test_mode_commands_are_bound() {
        let table = KeyTable::with_defaults();
        for command in ModeCommand::ALL {
            assert!(table.lookup_by_name(command.name()).is_some(), "{} unbound", command.name());
        }
    }

    #[test]
    fn test_key_for_prefers_short_binding() {
        let table = KeyTable::with_defaults();
        assert_eq!(table.key_for("kill-viewer"), Some(Key::char('q')));
        assert_eq!(table.key_for("next-error-line"), Some(Key::meta('n')));
        assert_eq!(table.key_for("no-such-command"), None);
    }
}
