//! Viewer state and main loop

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{debug, info, warn};

use crate::buffer::Buffer;
use crate::command::{CommandStatus, KeyTable};
use crate::config::Config;
use crate::display::{Display, Frame};
use crate::error::Result;
use crate::highlight::{
    Change, Debouncer, Direction, ErrorMode, Mark, MarkId, MarkStore, MatchLine, ModeCommand, Position, Presentation,
    Viewport,
};
use crate::input::{special, InputState, Key};
use crate::patterns::PatternSet;
use crate::terminal::{TermEvent, Terminal};
use crate::window::Window;

/// Rows reserved below the window (mode line and minibuffer)
const RESERVED_ROWS: u16 = 2;

/// Longest the loop sleeps when no timer is due
const IDLE_POLL: Duration = Duration::from_secs(1);

/// What the window is showing
#[derive(Debug)]
pub enum View {
    File,
    Errors(ErrorList),
}

/// The *Errors* listing
#[derive(Debug)]
pub struct ErrorList {
    pub entries: Vec<MatchLine>,
    pub selected: usize,
    /// First entry on screen
    pub top: usize,
}

impl ErrorList {
    fn select(&mut self, idx: usize, height: usize) {
        self.selected = idx.min(self.entries.len().saturating_sub(1));
        let height = height.max(1);
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + height {
            self.top = self.selected + 1 - height;
        }
    }
}

/// One entry of the F10 menu
#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: &'static str,
    /// Name of the bound command to run
    pub command: &'static str,
    /// Key hint shown beside the label
    pub key: String,
}

/// The F10 command menu
#[derive(Debug)]
pub struct Menu {
    pub items: Vec<MenuItem>,
    pub selected: usize,
}

/// The window as seen by the error mode: marks, cursor and mode commands
#[derive(Debug)]
pub struct ViewSurface {
    pub window: Window,
    pub marks: MarkStore,
    /// Mode commands currently offered to the user
    pub commands: Vec<ModeCommand>,
    line_count: usize,
}

impl ViewSurface {
    pub fn new(window: Window, line_count: usize) -> Self {
        Self {
            window,
            marks: MarkStore::new(),
            commands: Vec::new(),
            line_count,
        }
    }

    pub fn has_command(&self, command: ModeCommand) -> bool {
        self.commands.contains(&command)
    }
}

impl Presentation for ViewSurface {
    fn add_mark(&mut self, mark: Mark) -> MarkId {
        self.marks.insert(mark)
    }

    fn remove_mark(&mut self, id: MarkId) {
        self.marks.remove(id);
    }

    fn move_cursor(&mut self, pos: Position) {
        self.window.goto_line(pos.line, self.line_count);
    }

    fn viewport(&self) -> Viewport {
        self.window.viewport()
    }

    fn register_command(&mut self, command: ModeCommand) {
        if !self.commands.contains(&command) {
            self.commands.push(command);
        }
    }

    fn unregister_command(&mut self, command: ModeCommand) {
        self.commands.retain(|c| *c != command);
    }
}

/// Main viewer state
pub struct ViewerState {
    /// The file being viewed
    pub buffer: Buffer,
    /// Window, marks and registered mode commands
    pub surface: ViewSurface,
    /// Error highlighting for the buffer
    pub mode: ErrorMode,
    /// Pending re-scans
    pub debouncer: Debouncer,
    /// Display state
    pub display: Display,
    /// Input state
    pub input: InputState,
    /// Key bindings
    pub keytab: KeyTable,
    /// File or *Errors* listing
    pub view: View,
    /// Open F10 menu, if any
    pub menu: Option<Menu>,
    /// Whether the viewer is running
    pub running: bool,
    /// Reload the file as it changes on disk
    pub follow: bool,
    reload_interval: Duration,
    last_reload_check: Instant,
}

impl ViewerState {
    /// Create the viewer with error highlighting on
    pub fn new(buffer: Buffer, config: &Config, height: u16) -> Self {
        let line_count = buffer.line_count();
        let window = Window::new(height.max(1));
        let mode = ErrorMode::new(0, PatternSet::builtin(), config.highlight.style());

        let mut viewer = Self {
            buffer,
            surface: ViewSurface::new(window, line_count),
            mode,
            debouncer: Debouncer::new(config.debounce_delay()),
            display: Display::new(config.line_numbers, config.tab_width),
            input: InputState::new(),
            keytab: KeyTable::with_defaults(),
            view: View::File,
            menu: None,
            running: true,
            follow: config.follow,
            reload_interval: config.reload_interval(),
            last_reload_check: Instant::now(),
        };
        viewer.mode.enable(&viewer.buffer, &mut viewer.surface);
        viewer
    }

    /// Main loop
    pub fn run(&mut self, terminal: &mut Terminal) -> Result<()> {
        self.resize(terminal.rows());
        self.display.force_redraw();
        info!(file = self.buffer.name(), lines = self.buffer.line_count(), "viewer started");

        while self.running {
            self.tick(Instant::now());
            self.render(terminal)?;

            let timeout = self.poll_timeout(Instant::now());
            match terminal.next_event(timeout)? {
                TermEvent::Key(event) if self.menu.is_some() && event.code == KeyCode::Esc => {
                    self.dismiss_menu();
                }
                TermEvent::Key(event) => {
                    if let Some(key) = self.input.translate_key(event) {
                        match self.handle_key(key)? {
                            CommandStatus::Success => {}
                            CommandStatus::Failure => terminal.beep()?,
                            CommandStatus::Abort => {
                                self.display.set_message("Quit");
                                terminal.beep()?;
                            }
                        }
                    } else if let Some(prompt) = self.input.pending_prompt() {
                        // Show that we are waiting for a continuation key
                        self.display.set_message(prompt);
                    }
                }
                TermEvent::Resize => {
                    self.resize(terminal.rows());
                    self.display.force_redraw();
                }
                TermEvent::Idle => {}
            }
        }

        info!("viewer stopped");
        Ok(())
    }

    fn render(&mut self, terminal: &mut Terminal) -> Result<()> {
        let frame = Frame {
            buffer: &self.buffer,
            surface: &self.surface,
            view: &self.view,
            menu: self.menu.as_ref(),
            mode_enabled: self.mode.is_enabled(),
            follow: self.follow,
        };
        self.display.render(terminal, &frame)
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: Key) -> Result<CommandStatus> {
        self.display.clear_message();

        if self.menu.is_some() {
            return self.handle_menu_key(key);
        }

        if let View::Errors(_) = self.view {
            if let Some(status) = self.handle_list_key(key) {
                return Ok(status);
            }
            // Anything else acts on the file again
            self.view = View::File;
            self.display.force_redraw();
        }

        self.run_key(key)
    }

    /// Run the command bound to a key in the file view
    fn run_key(&mut self, key: Key) -> Result<CommandStatus> {
        let (cmd, name) = match (self.keytab.lookup(key), self.keytab.lookup_name(key)) {
            (Some(cmd), Some(name)) => (cmd, name),
            _ => {
                self.display.set_message("Key not bound");
                return Ok(CommandStatus::Failure);
            }
        };
        self.run_named(cmd, name)
    }

    fn run_named(&mut self, cmd: crate::command::CommandFn, name: &str) -> Result<CommandStatus> {
        let mode_command = ModeCommand::ALL.into_iter().find(|c| c.name() == name);
        if let Some(command) = mode_command {
            if !self.surface.has_command(command) {
                self.display.set_message("Error highlighting is off");
                return Ok(CommandStatus::Failure);
            }
        }

        debug!(command = name, "running command");
        let status = cmd(self, false, 1)?;
        self.sync_viewport();
        Ok(status)
    }

    /// Keys of the *Errors* listing; None for keys it does not handle
    fn handle_list_key(&mut self, key: Key) -> Option<CommandStatus> {
        let height = self.surface.window.height() as usize;
        let list = match &mut self.view {
            View::Errors(list) => list,
            View::File => return None,
        };

        if key == Key::ctrl('n') || key == Key::special(special::DOWN) || key == Key::char('n') {
            let next = list.selected + 1;
            if next >= list.entries.len() {
                return Some(CommandStatus::Failure);
            }
            list.select(next, height);
            Some(CommandStatus::Success)
        } else if key == Key::ctrl('p') || key == Key::special(special::UP) || key == Key::char('p') {
            if list.selected == 0 {
                return Some(CommandStatus::Failure);
            }
            list.select(list.selected - 1, height);
            Some(CommandStatus::Success)
        } else if key == Key::ctrl('m') {
            Some(self.jump_to_selected())
        } else if key == Key::char('q') || key == Key::ctrl('g') {
            self.view = View::File;
            self.display.force_redraw();
            Some(CommandStatus::Success)
        } else {
            None
        }
    }

    /// Keys of the open F10 menu
    fn handle_menu_key(&mut self, key: Key) -> Result<CommandStatus> {
        let menu = match &mut self.menu {
            Some(menu) => menu,
            None => return Ok(CommandStatus::Failure),
        };

        if key == Key::ctrl('n') || key == Key::special(special::DOWN) {
            menu.selected = (menu.selected + 1) % menu.items.len().max(1);
            Ok(CommandStatus::Success)
        } else if key == Key::ctrl('p') || key == Key::special(special::UP) {
            let len = menu.items.len().max(1);
            menu.selected = (menu.selected + len - 1) % len;
            Ok(CommandStatus::Success)
        } else if key == Key::ctrl('m') {
            let command = menu.items.get(menu.selected).map(|item| item.command);
            self.menu = None;
            self.display.force_redraw();
            match command.and_then(|name| self.keytab.lookup_by_name(name).map(|cmd| (cmd, name))) {
                Some((cmd, name)) => self.run_named(cmd, name),
                None => Ok(CommandStatus::Failure),
            }
        } else if key == Key::ctrl('g') || key == Key::char('q') || key == Key::function(10) {
            self.dismiss_menu();
            Ok(CommandStatus::Abort)
        } else {
            Ok(CommandStatus::Failure)
        }
    }

    fn dismiss_menu(&mut self) {
        self.menu = None;
        self.input.reset();
        self.display.force_redraw();
    }

    /// Re-scan if the window moved away from the marked lines
    fn sync_viewport(&mut self) {
        if self.mode.viewport_moved(&self.buffer, &mut self.surface) {
            self.display.force_redraw();
        }
    }

    /// Fire due timers: debounced re-scans and file polling
    ///
    /// Returns true when anything on screen may have changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        for buffer in self.debouncer.take_due(now) {
            if buffer == self.mode.buffer() {
                let placed = self.mode.refresh(&self.buffer, &mut self.surface);
                debug!(buffer, marks = placed, "debounced re-scan");
                changed = true;
            }
        }

        if self.follow && now.saturating_duration_since(self.last_reload_check) >= self.reload_interval {
            changed |= self.check_reload(now);
        }

        if changed {
            self.display.force_redraw();
        }
        changed
    }

    /// How long the main loop may wait for input
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = self.debouncer.time_until_next(now).unwrap_or(IDLE_POLL);
        if self.follow {
            let next_check = self.last_reload_check + self.reload_interval;
            timeout = timeout.min(next_check.saturating_duration_since(now));
        }
        timeout.min(IDLE_POLL)
    }

    /// Re-read the file if it changed on disk
    ///
    /// Returns true when the buffer contents changed.
    pub fn check_reload(&mut self, now: Instant) -> bool {
        self.last_reload_check = now;
        match self.buffer.reload() {
            Ok(Some(change)) => {
                self.buffer_changed(change, now);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.display.set_message(format!("Reload failed: {}", e));
                false
            }
        }
    }

    /// Apply a change to the buffer's lines: keep the window valid, drop
    /// marks on changed lines and queue a debounced re-scan
    pub fn buffer_changed(&mut self, change: Change, now: Instant) {
        let old_count = self.surface.line_count;
        let new_count = self.buffer.line_count();
        let at_end = self.surface.window.cursor_line() + 1 >= old_count;

        self.surface.line_count = new_count;
        self.surface.window.clamp_to(new_count);

        info!(start = change.start, end = change.end, lines = new_count, "buffer changed");
        self.mode.buffer_changed(change, &mut self.surface, &mut self.debouncer, now);

        if self.follow && at_end && new_count > old_count {
            self.surface.window.goto_line(new_count - 1, new_count);
            self.sync_viewport();
        }
        self.display.force_redraw();
    }

    /// Move to the next or previous error line from the cursor
    pub fn goto_error(&mut self, direction: Direction) -> Option<Position> {
        let from = Position::line_start(self.surface.window.cursor_line());
        self.mode.goto_error(&self.buffer, from, direction, &mut self.surface)
    }

    /// Show the *Errors* listing; returns the number of entries
    pub fn open_error_list(&mut self) -> usize {
        let entries: Vec<MatchLine> = self.mode.list_errors(&self.buffer).collect();
        if entries.is_empty() {
            return 0;
        }

        let cursor = self.surface.window.cursor_line();
        let count = entries.len();
        let mut list = ErrorList {
            entries,
            selected: 0,
            top: 0,
        };
        // Start on the first error at or after the cursor
        let start = list.entries.iter().position(|m| m.line >= cursor).unwrap_or(count - 1);
        list.select(start, self.surface.window.height() as usize);

        self.view = View::Errors(list);
        self.display.force_redraw();
        count
    }

    /// Leave the listing and move to the selected error line
    pub fn jump_to_selected(&mut self) -> CommandStatus {
        let line = match &self.view {
            View::Errors(list) => list.entries.get(list.selected).map(|m| m.line),
            View::File => None,
        };
        self.view = View::File;
        self.display.force_redraw();

        match line {
            Some(line) => {
                self.surface.move_cursor(Position::line_start(line));
                self.sync_viewport();
                self.display.set_message(format!("Error line {}", line + 1));
                CommandStatus::Success
            }
            None => CommandStatus::Failure,
        }
    }

    /// Toggle error highlighting; returns whether it is now on
    pub fn toggle_mode(&mut self) -> bool {
        let enabled = self.mode.toggle(&self.buffer, &mut self.surface, &mut self.debouncer);
        self.display.force_redraw();
        enabled
    }

    /// Open the F10 menu
    pub fn open_menu(&mut self) {
        let mut entries: Vec<(&'static str, &'static str)> = self
            .surface
            .commands
            .iter()
            .map(|c| (c.label(), c.name()))
            .collect();
        entries.extend([
            ("Error highlighting", "error-highlight-mode"),
            ("Follow file", "auto-revert-tail-mode"),
            ("Revert", "revert-buffer"),
            ("Quit", "kill-viewer"),
        ]);

        let items = entries
            .into_iter()
            .map(|(label, command)| MenuItem {
                label,
                command,
                key: self
                    .keytab
                    .key_for(command)
                    .map(|k| k.display_name())
                    .unwrap_or_default(),
            })
            .collect();

        self.menu = Some(Menu { items, selected: 0 });
        self.display.force_redraw();
    }

    /// Fit the window to a terminal of `rows` rows
    pub fn resize(&mut self, rows: u16) {
        self.surface.window.set_height(rows.saturating_sub(RESERVED_ROWS).max(1));
        self.sync_viewport();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;
    use std::io::Write;

    use super::*;

    pub(crate) fn viewer_with(total: usize, errors: &[usize], height: u16) -> ViewerState {
        let lines = (0..total).map(|i| {
            if errors.contains(&i) {
                format!("{} ERROR request failed", i)
            } else {
                format!("{} INFO request ok", i)
            }
        });
        let buffer = Buffer::from_lines("test.log", lines);
        ViewerState::new(buffer, &Config::default(), height)
    }

    #[test]
    fn test_opens_with_visible_errors_marked() {
        let viewer = viewer_with(100, &[2, 7, 90], 10);
        assert!(viewer.mode.is_enabled());
        assert_eq!(viewer.surface.marks.marked_lines(), vec![2, 7]);
        assert_eq!(viewer.surface.commands, ModeCommand::ALL.to_vec());
    }

    #[test]
    fn test_scrolling_away_rescans() {
        let mut viewer = viewer_with(200, &[5, 150], 10);
        assert_eq!(viewer.surface.marks.marked_lines(), vec![5]);

        viewer.handle_key(Key::meta('>')).unwrap();
        assert_eq!(viewer.surface.window.cursor_line(), 199);
        assert!(viewer.surface.marks.marked_lines().is_empty());

        viewer.surface.window.goto_line(150, 200);
        viewer.sync_viewport();
        assert_eq!(viewer.surface.marks.marked_lines(), vec![150]);
    }

    #[test]
    fn test_mode_commands_need_mode() {
        let mut viewer = viewer_with(50, &[20], 10);
        viewer.toggle_mode();

        let status = viewer.handle_key(Key::meta('n')).unwrap();
        assert_eq!(status, CommandStatus::Failure);
        assert_eq!(viewer.surface.window.cursor_line(), 0);
        assert_eq!(viewer.display.message(), Some("Error highlighting is off"));

        viewer.toggle_mode();
        assert_eq!(viewer.handle_key(Key::meta('n')).unwrap(), CommandStatus::Success);
        assert_eq!(viewer.surface.window.cursor_line(), 20);
    }

    #[test]
    fn test_unbound_key() {
        let mut viewer = viewer_with(5, &[], 5);
        assert_eq!(viewer.handle_key(Key::ctrl('z')).unwrap(), CommandStatus::Failure);
        assert_eq!(viewer.display.message(), Some("Key not bound"));
    }

    #[test]
    fn test_error_list_jump() {
        let mut viewer = viewer_with(300, &[10, 120, 250], 10);
        assert_eq!(viewer.open_error_list(), 3);

        viewer.handle_key(Key::special(special::DOWN)).unwrap();
        viewer.handle_key(Key::char('n')).unwrap();
        assert_eq!(viewer.handle_key(Key::char('n')).unwrap(), CommandStatus::Failure);
        match &viewer.view {
            View::Errors(list) => assert_eq!(list.selected, 2),
            View::File => panic!("listing closed"),
        }

        assert_eq!(viewer.handle_key(Key::ctrl('m')).unwrap(), CommandStatus::Success);
        assert!(matches!(viewer.view, View::File));
        assert_eq!(viewer.surface.window.cursor_line(), 250);
        assert_eq!(viewer.surface.marks.marked_lines(), vec![250]);
    }

    #[test]
    fn test_error_list_starts_at_cursor() {
        let mut viewer = viewer_with(300, &[10, 120, 250], 10);
        viewer.surface.window.goto_line(100, 300);
        viewer.open_error_list();
        match &viewer.view {
            View::Errors(list) => assert_eq!(list.selected, 1),
            View::File => panic!("listing not shown"),
        }
        viewer.handle_key(Key::char('q')).unwrap();
        assert!(matches!(viewer.view, View::File));
        assert_eq!(viewer.surface.window.cursor_line(), 100);
    }

    #[test]
    fn test_menu_runs_selected_command() {
        let mut viewer = viewer_with(100, &[30, 60], 10);
        viewer.handle_key(Key::function(10)).unwrap();
        let menu = viewer.menu.as_ref().unwrap();
        assert_eq!(menu.items[0].command, "next-error-line");
        assert_eq!(menu.items[0].key, "M-n");

        viewer.handle_key(Key::ctrl('m')).unwrap();
        assert!(viewer.menu.is_none());
        assert_eq!(viewer.surface.window.cursor_line(), 30);
    }

    #[test]
    fn test_menu_hides_mode_commands_when_off() {
        let mut viewer = viewer_with(10, &[], 10);
        viewer.toggle_mode();
        viewer.open_menu();
        let commands: Vec<&str> = viewer.menu.as_ref().unwrap().items.iter().map(|i| i.command).collect();
        assert!(!commands.contains(&"next-error-line"));
        assert!(commands.contains(&"error-highlight-mode"));

        assert_eq!(viewer.handle_key(Key::ctrl('g')).unwrap(), CommandStatus::Abort);
        assert!(viewer.menu.is_none());
    }

    #[test]
    fn test_change_rescans_after_quiet_period() {
        let mut viewer = viewer_with(5, &[], 10);
        viewer.follow = false;
        let delay = viewer.debouncer.delay();
        let start = Instant::now();

        let mut lines: Vec<String> = viewer.buffer.lines().to_vec();
        lines.push("5 ERROR late failure".to_string());
        let change = viewer.buffer.replace_lines(lines).unwrap();
        viewer.buffer_changed(change, start);
        assert!(viewer.mode.scan_state().borrow().is_pending());

        // A second change inside the quiet period pushes the deadline back
        let later = start + delay / 2;
        viewer.buffer_changed(Change::new(5, 6), later);
        assert_eq!(viewer.debouncer.queued(), 1);

        assert!(!viewer.tick(start + delay));
        assert!(viewer.surface.marks.is_empty());

        assert!(viewer.tick(later + delay));
        assert_eq!(viewer.surface.marks.marked_lines(), vec![5]);
        assert!(!viewer.mode.scan_state().borrow().is_pending());
    }

    #[test]
    fn test_rewritten_lines_lose_their_marks() {
        let mut viewer = viewer_with(5, &[1], 10);
        viewer.follow = false;
        assert_eq!(viewer.surface.marks.marked_lines(), vec![1]);

        let lines = (0..5).map(|i| format!("{} INFO rotated", i)).collect();
        let change = viewer.buffer.replace_lines(lines).unwrap();
        viewer.buffer_changed(change, Instant::now());

        assert!(viewer.surface.marks.is_empty());
        assert!(viewer.mode.scan_state().borrow().is_pending());
    }

    #[test]
    fn test_appended_lines_keep_earlier_marks() {
        let mut viewer = viewer_with(5, &[1], 10);
        viewer.follow = false;

        let mut lines: Vec<String> = viewer.buffer.lines().to_vec();
        lines.push("5 INFO more".to_string());
        let change = viewer.buffer.replace_lines(lines).unwrap();
        viewer.buffer_changed(change, Instant::now());

        assert_eq!(viewer.surface.marks.marked_lines(), vec![1]);
    }

    #[test]
    fn test_follow_marks_errors_scrolled_into_view() {
        let mut viewer = viewer_with(20, &[], 10);
        viewer.handle_key(Key::meta('>')).unwrap();

        let mut lines: Vec<String> = viewer.buffer.lines().to_vec();
        lines.extend((20..40).map(|i| {
            if i == 35 {
                format!("{} ERROR late failure", i)
            } else {
                format!("{} INFO more", i)
            }
        }));
        let change = viewer.buffer.replace_lines(lines).unwrap();
        viewer.buffer_changed(change, Instant::now());

        assert_eq!(viewer.surface.window.cursor_line(), 39);
        assert_eq!(viewer.surface.marks.marked_lines(), vec![35]);
    }

    #[test]
    fn test_disable_cancels_pending_rescan() {
        let mut viewer = viewer_with(5, &[1], 10);
        viewer.buffer_changed(Change::new(0, 5), Instant::now());
        assert_eq!(viewer.debouncer.queued(), 1);

        viewer.toggle_mode();
        assert_eq!(viewer.debouncer.queued(), 0);
        assert!(viewer.surface.marks.is_empty());
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "INFO starting\nINFO ready\n").unwrap();

        let buffer = Buffer::from_file(&path).unwrap();
        let mut viewer = ViewerState::new(buffer, &Config::default(), 10);
        assert!(viewer.surface.marks.is_empty());

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "SEVERE out of memory").unwrap();
        drop(file);

        let now = Instant::now();
        assert!(viewer.check_reload(now));
        assert_eq!(viewer.buffer.line_count(), 3);
        assert!(viewer.surface.marks.is_empty());

        viewer.tick(now + viewer.debouncer.delay());
        assert_eq!(viewer.surface.marks.marked_lines(), vec![2]);
        assert!(!viewer.check_reload(now));
    }

    #[test]
    fn test_follow_tracks_end_of_file() {
        let mut viewer = viewer_with(20, &[], 10);
        viewer.handle_key(Key::meta('>')).unwrap();
        assert_eq!(viewer.surface.window.cursor_line(), 19);

        let mut lines: Vec<String> = viewer.buffer.lines().to_vec();
        lines.extend((20..40).map(|i| format!("{} INFO more", i)));
        let change = viewer.buffer.replace_lines(lines).unwrap();
        viewer.buffer_changed(change, Instant::now());
        assert_eq!(viewer.surface.window.cursor_line(), 39);

        viewer.follow = false;
        let mut lines: Vec<String> = viewer.buffer.lines().to_vec();
        lines.push("40 INFO more".to_string());
        let change = viewer.buffer.replace_lines(lines).unwrap();
        viewer.buffer_changed(change, Instant::now());
        assert_eq!(viewer.surface.window.cursor_line(), 39);
    }

    #[test]
    fn test_poll_timeout_tracks_deadline() {
        let mut viewer = viewer_with(5, &[], 10);
        viewer.follow = false;
        let now = Instant::now();
        assert_eq!(viewer.poll_timeout(now), IDLE_POLL);

        viewer.debouncer = Debouncer::new(Duration::from_millis(200));
        viewer.buffer_changed(Change::new(0, 1), now);
        assert_eq!(viewer.poll_timeout(now), Duration::from_millis(200));
    }

    #[test]
    fn test_resize_keeps_cursor_visible() {
        let mut viewer = viewer_with(100, &[], 30);
        viewer.surface.window.goto_line(25, 100);
        viewer.resize(12);
        assert_eq!(viewer.surface.window.height(), 10);
        assert!(viewer.surface.window.is_line_visible(25));
    }
}
