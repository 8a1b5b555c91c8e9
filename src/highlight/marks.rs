//! Highlight marks and the seams to the host
//!
//! The highlighter never touches the screen or the key map directly. It
//! reads text through [`LineSource`] and pushes every visible effect
//! (marks, cursor moves, command registration) through [`Presentation`].

use std::collections::BTreeMap;

use super::style::Style;

/// A position in a buffer: line index and byte column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Start of the given line
    pub fn line_start(line: usize) -> Self {
        Self { line, col: 0 }
    }
}

/// Lines touched by a buffer mutation, half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub start: usize,
    pub end: usize,
}

impl Change {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Lines currently rendered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible line
    pub top: usize,
    /// Number of visible rows
    pub height: usize,
}

impl Viewport {
    pub fn new(top: usize, height: usize) -> Self {
        Self { top, height }
    }

    /// Reference line the scan window is centred on
    pub fn anchor(&self) -> usize {
        self.top + self.height / 2
    }

    /// One past the last visible line
    pub fn bottom(&self) -> usize {
        self.top + self.height
    }
}

/// Search direction for error navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Identifier handed out by the host for a created mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkId(pub u64);

/// A highlighted half-open range `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub start: Position,
    pub end: Position,
    pub style: Style,
}

impl Mark {
    /// Mark covering a whole line of `len` bytes
    pub fn whole_line(line: usize, len: usize, style: Style) -> Self {
        Self {
            start: Position::line_start(line),
            end: Position::new(line, len),
            style,
        }
    }

    /// Byte range this mark covers on a line of `line_len` bytes
    pub fn span_on(&self, line: usize, line_len: usize) -> Option<(usize, usize)> {
        if line < self.start.line || line > self.end.line {
            return None;
        }
        let start = if line == self.start.line { self.start.col } else { 0 };
        let end = if line == self.end.line { self.end.col } else { line_len };
        let end = end.min(line_len);
        if start < end {
            Some((start, end))
        } else {
            None
        }
    }
}

/// Commands the error mode contributes to the host's key map and menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeCommand {
    NextError,
    PreviousError,
    ListErrors,
}

impl ModeCommand {
    pub const ALL: [ModeCommand; 3] = [
        ModeCommand::NextError,
        ModeCommand::PreviousError,
        ModeCommand::ListErrors,
    ];

    /// Command name as bound in the key table
    pub fn name(&self) -> &'static str {
        match self {
            ModeCommand::NextError => "next-error-line",
            ModeCommand::PreviousError => "previous-error-line",
            ModeCommand::ListErrors => "list-error-lines",
        }
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            ModeCommand::NextError => "Next error",
            ModeCommand::PreviousError => "Previous error",
            ModeCommand::ListErrors => "List all errors",
        }
    }
}

/// Read access to line-addressable text
pub trait LineSource {
    /// Number of lines
    fn line_count(&self) -> usize;

    /// Text of a line, without its terminator
    fn line(&self, idx: usize) -> Option<&str>;
}

impl<S: AsRef<str>> LineSource for [S] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, idx: usize) -> Option<&str> {
        self.get(idx).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> LineSource for Vec<S> {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, idx: usize) -> Option<&str> {
        self.get(idx).map(AsRef::as_ref)
    }
}

/// Everything the mode needs from the host's rendering and input layers
pub trait Presentation {
    /// Create a visual mark, returning its handle
    fn add_mark(&mut self, mark: Mark) -> MarkId;

    /// Remove a mark created earlier; unknown ids are ignored
    fn remove_mark(&mut self, id: MarkId);

    /// Move the cursor, scrolling as the host sees fit
    fn move_cursor(&mut self, pos: Position);

    /// Lines currently on screen
    fn viewport(&self) -> Viewport;

    /// Expose a mode command in the key map and menu
    fn register_command(&mut self, command: ModeCommand);

    /// Withdraw a mode command
    fn unregister_command(&mut self, command: ModeCommand);
}

/// Mark storage for hosts
#[derive(Debug, Default)]
pub struct MarkStore {
    next_id: u64,
    marks: BTreeMap<MarkId, Mark>,
}

impl MarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mark: Mark) -> MarkId {
        let id = MarkId(self.next_id);
        self.next_id += 1;
        self.marks.insert(id, mark);
        id
    }

    pub fn remove(&mut self, id: MarkId) -> Option<Mark> {
        self.marks.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks touching a line
    pub fn on_line(&self, line: usize) -> impl Iterator<Item = &Mark> + '_ {
        self.marks
            .values()
            .filter(move |m| m.start.line <= line && line <= m.end.line)
    }

    /// Lines that start a mark, sorted and deduplicated
    #[cfg(test)]
    pub fn marked_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self.marks.values().map(|m| m.start.line).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_line_mark() {
        let mark = Mark::whole_line(4, 12, Style::default());
        assert_eq!(mark.start, Position::line_start(4));
        assert_eq!(mark.end, Position::new(4, 12));
        assert_eq!(mark.span_on(4, 12), Some((0, 12)));
        assert_eq!(mark.span_on(3, 12), None);
    }

    #[test]
    fn test_empty_line_mark_has_no_span() {
        let mark = Mark::whole_line(0, 0, Style::default());
        assert_eq!(mark.span_on(0, 0), None);
    }

    #[test]
    fn test_viewport_anchor() {
        let vp = Viewport::new(10, 20);
        assert_eq!(vp.anchor(), 20);
        assert_eq!(vp.bottom(), 30);
    }

    #[test]
    fn test_mark_store() {
        let mut store = MarkStore::new();
        let a = store.insert(Mark::whole_line(3, 5, Style::default()));
        let b = store.insert(Mark::whole_line(1, 5, Style::default()));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.marked_lines(), vec![1, 3]);
        assert_eq!(store.on_line(3).count(), 1);
        assert_eq!(store.on_line(2).count(), 0);

        assert!(store.remove(a).is_some());
        assert!(store.remove(a).is_none());
        assert_eq!(store.marked_lines(), vec![1]);
    }

    #[test]
    fn test_line_source_for_slices() {
        let lines = vec!["one", "two"];
        assert_eq!(lines.line_count(), 2);
        assert_eq!(lines.line(1), Some("two"));
        assert_eq!(lines.line(2), None);
    }
}
