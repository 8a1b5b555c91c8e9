//! The error highlighting mode for one buffer

use std::time::Instant;

use tracing::{debug, info};

use super::debounce::{BufferId, Debouncer, ScanState, SharedScanState};
use super::marks::{Change, Direction, LineSource, ModeCommand, Position, Presentation};
use super::scan::{Highlighter, Matches};
use super::style::Style;
use crate::patterns::PatternSet;

/// Error highlighting attached to a single buffer
///
/// The mode starts disabled. Enabling it registers its commands with the
/// host and marks the lines around the viewport; disabling it removes
/// every mark and cancels a pending re-scan.
pub struct ErrorMode {
    highlighter: Highlighter,
    scan_state: SharedScanState,
    enabled: bool,
}

impl ErrorMode {
    pub fn new(buffer: BufferId, patterns: PatternSet, style: Style) -> Self {
        Self {
            highlighter: Highlighter::new(patterns, style),
            scan_state: ScanState::shared(buffer),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn buffer(&self) -> BufferId {
        self.scan_state.borrow().buffer()
    }

    #[cfg(test)]
    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    #[cfg(test)]
    pub fn scan_state(&self) -> &SharedScanState {
        &self.scan_state
    }

    /// Turn the mode on
    pub fn enable<S, P>(&mut self, source: &S, port: &mut P)
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        if self.enabled {
            return;
        }
        self.enabled = true;
        for command in ModeCommand::ALL {
            port.register_command(command);
        }
        let placed = self.refresh(source, port);
        info!(buffer = self.buffer(), marks = placed, "error highlighting enabled");
    }

    /// Turn the mode off, removing all marks
    pub fn disable<P>(&mut self, port: &mut P, debouncer: &mut Debouncer)
    where
        P: Presentation + ?Sized,
    {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.highlighter.clear_marks(port);
        debouncer.cancel(&self.scan_state);
        for command in ModeCommand::ALL {
            port.unregister_command(command);
        }
        info!(buffer = self.buffer(), "error highlighting disabled");
    }

    /// Flip the mode; returns the new state
    pub fn toggle<S, P>(&mut self, source: &S, port: &mut P, debouncer: &mut Debouncer) -> bool
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        if self.enabled {
            self.disable(port, debouncer);
        } else {
            self.enable(source, port);
        }
        self.enabled
    }

    /// Clear and rebuild marks around the host's current viewport
    ///
    /// Returns the number of marks placed.
    pub fn refresh<S, P>(&mut self, source: &S, port: &mut P) -> usize
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        if !self.enabled {
            return 0;
        }
        let viewport = port.viewport();
        self.highlighter.rescan(source, viewport.anchor(), viewport.height, port)
    }

    /// Re-scan only if the viewport has left the last scanned window
    ///
    /// Returns true when a re-scan ran.
    pub fn viewport_moved<S, P>(&mut self, source: &S, port: &mut P) -> bool
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        if !self.enabled {
            return false;
        }
        let viewport = port.viewport();
        if self.highlighter.covers(viewport.top, viewport.bottom()) {
            return false;
        }
        self.refresh(source, port);
        true
    }

    /// Change hook: drop marks on changed lines and queue a debounced re-scan
    ///
    /// Marks from `change.start` on may sit on lines whose text is gone, so
    /// they are removed now. Returns true when a new re-scan was scheduled.
    pub fn buffer_changed<P>(&mut self, change: Change, port: &mut P, debouncer: &mut Debouncer, now: Instant) -> bool
    where
        P: Presentation + ?Sized,
    {
        if !self.enabled {
            return false;
        }
        let dropped = self.highlighter.clear_from(change.start, port);
        debug!(
            buffer = self.buffer(),
            start = change.start,
            end = change.end,
            dropped,
            "buffer changed"
        );
        debouncer.notify(&self.scan_state, now)
    }

    /// Move the cursor to the next or previous error line
    ///
    /// Leaves the cursor alone and returns None when there is no error
    /// line in that direction.
    pub fn goto_error<S, P>(&mut self, source: &S, from: Position, direction: Direction, port: &mut P) -> Option<Position>
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        let target = self.highlighter.find_adjacent_match(source, from, direction)?;
        port.move_cursor(target);
        self.refresh(source, port);
        Some(target)
    }

    /// Every error line in the buffer, for the summary listing
    pub fn list_errors<'a, S>(&'a self, source: &'a S) -> Matches<'a, S>
    where
        S: LineSource + ?Sized,
    {
        self.highlighter.collect_all_matches(source)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::highlight::marks::testing::FakePort;

    fn mode() -> ErrorMode {
        ErrorMode::new(0, PatternSet::builtin(), Style::error_line())
    }

    fn log(total: usize, errors: &[usize]) -> Vec<String> {
        (0..total)
            .map(|i| {
                if errors.contains(&i) {
                    format!("line {} ERROR boom", i)
                } else {
                    format!("line {} INFO ok", i)
                }
            })
            .collect()
    }

    #[test]
    fn test_enable_registers_commands_and_marks() {
        let lines = log(100, &[2, 5, 60]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 10);

        mode.enable(&lines, &mut port);

        assert!(mode.is_enabled());
        assert_eq!(port.commands, ModeCommand::ALL.to_vec());
        assert_eq!(port.marks.marked_lines(), vec![2, 5]);
    }

    #[test]
    fn test_disable_clears_everything() {
        let lines = log(20, &[1, 3]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 10);
        let mut debouncer = Debouncer::new(Duration::from_secs(3));

        mode.enable(&lines, &mut port);
        mode.buffer_changed(Change::new(0, 1), &mut port, &mut debouncer, Instant::now());
        mode.disable(&mut port, &mut debouncer);

        assert!(!mode.is_enabled());
        assert!(port.marks.is_empty());
        assert!(port.commands.is_empty());
        assert_eq!(debouncer.queued(), 0);
        assert!(!mode.scan_state().borrow().is_pending());
    }

    #[test]
    fn test_toggle() {
        let lines = log(5, &[0]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 5);
        let mut debouncer = Debouncer::default();

        assert!(mode.toggle(&lines, &mut port, &mut debouncer));
        assert_eq!(port.marks.len(), 1);
        assert!(!mode.toggle(&lines, &mut port, &mut debouncer));
        assert_eq!(port.marks.len(), 0);
    }

    #[test]
    fn test_disabled_mode_ignores_changes() {
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 10);
        let mut debouncer = Debouncer::default();
        assert!(!mode.buffer_changed(Change::new(0, 1), &mut port, &mut debouncer, Instant::now()));
        assert_eq!(debouncer.queued(), 0);
    }

    #[test]
    fn test_change_drops_marks_from_first_changed_line() {
        let mut lines = log(20, &[2, 6, 9]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 10);
        let mut debouncer = Debouncer::default();
        mode.enable(&lines, &mut port);
        assert_eq!(port.marks.marked_lines(), vec![2, 6, 9]);

        lines[6] = "line 6 INFO recovered".to_string();
        lines[9] = "line 9 INFO recovered".to_string();
        assert!(mode.buffer_changed(Change::new(6, 10), &mut port, &mut debouncer, Instant::now()));

        assert_eq!(port.marks.marked_lines(), vec![2]);
        assert_eq!(debouncer.queued(), 1);
    }

    #[test]
    fn test_goto_error_moves_cursor_and_rescans() {
        let lines = log(200, &[3, 150]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 10);
        mode.enable(&lines, &mut port);
        assert_eq!(port.marks.marked_lines(), vec![3]);

        let target = mode.goto_error(&lines, Position::line_start(3), Direction::Forward, &mut port);

        assert_eq!(target, Some(Position::line_start(150)));
        assert_eq!(port.cursor, Position::line_start(150));
        assert_eq!(port.marks.marked_lines(), vec![150]);
    }

    #[test]
    fn test_goto_error_without_match_is_noop() {
        let lines = log(10, &[1]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(0, 10);
        mode.enable(&lines, &mut port);
        port.cursor = Position::new(4, 2);

        let target = mode.goto_error(&lines, port.cursor, Direction::Forward, &mut port);

        assert_eq!(target, None);
        assert_eq!(port.cursor, Position::new(4, 2));
        assert_eq!(port.marks.marked_lines(), vec![1]);
    }

    #[test]
    fn test_viewport_moved_within_margin_keeps_marks() {
        let lines = log(200, &[40, 100]);
        let mut mode = mode();
        let mut port = FakePort::with_viewport(40, 20);
        mode.enable(&lines, &mut port);
        assert_eq!(mode.highlighter().scanned_window(), Some((30, 70)));

        port.viewport.top = 45;
        assert!(!mode.viewport_moved(&lines, &mut port));

        port.viewport.top = 90;
        assert!(mode.viewport_moved(&lines, &mut port));
        assert_eq!(port.marks.marked_lines(), vec![100]);
    }

    #[test]
    fn test_list_errors_covers_whole_buffer() {
        let lines = log(500, &[0, 250, 499]);
        let mode = mode();
        let found: Vec<usize> = mode.list_errors(&lines).map(|m| m.line).collect();
        assert_eq!(found, vec![0, 250, 499]);
    }
}
