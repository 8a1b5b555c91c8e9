//! Viewport-bounded error line scanning
//!
//! Only the lines around the viewport are ever marked. A re-scan clears
//! every mark the highlighter owns and rebuilds them from scratch; there
//! is no diffing against the previous mark set.

use std::collections::BTreeMap;

use tracing::debug;

use super::marks::{Direction, LineSource, Mark, MarkId, Position, Presentation};
use super::style::Style;
use crate::patterns::PatternSet;

/// Scan window for a viewport: one viewport height either side of `anchor`
pub fn viewport_bounds(anchor: usize, height: usize) -> (usize, usize) {
    let height = height.max(1);
    (anchor.saturating_sub(height), anchor.saturating_add(height))
}

/// Search line by line for the next error line before or after `from`
///
/// Forward search starts past the end of the current line and backward
/// search starts before its beginning, so the current line never matches.
pub fn find_adjacent_match<S>(
    source: &S,
    patterns: &PatternSet,
    from: Position,
    direction: Direction,
) -> Option<Position>
where
    S: LineSource + ?Sized,
{
    let count = source.line_count();
    let is_error = |idx: &usize| source.line(*idx).map_or(false, |text| patterns.is_match(text));

    let found = match direction {
        Direction::Forward => (from.line.saturating_add(1)..count).find(is_error),
        Direction::Backward => (0..from.line.min(count)).rev().find(is_error),
    };

    found.map(Position::line_start)
}

/// An error line reported by [`collect_all_matches`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLine {
    /// Line index (0-based)
    pub line: usize,
    /// Full text of the line
    pub text: String,
}

/// Lazy walk over every error line in a buffer, in order
pub struct Matches<'a, S: ?Sized> {
    source: &'a S,
    patterns: &'a PatternSet,
    next: usize,
}

impl<'a, S: LineSource + ?Sized> Iterator for Matches<'a, S> {
    type Item = MatchLine;

    fn next(&mut self) -> Option<MatchLine> {
        while self.next < self.source.line_count() {
            let idx = self.next;
            self.next += 1;
            if let Some(text) = self.source.line(idx) {
                if self.patterns.is_match(text) {
                    return Some(MatchLine {
                        line: idx,
                        text: text.to_string(),
                    });
                }
            }
        }
        None
    }
}

/// Every error line in the buffer, ignoring the viewport
pub fn collect_all_matches<'a, S>(source: &'a S, patterns: &'a PatternSet) -> Matches<'a, S>
where
    S: LineSource + ?Sized,
{
    Matches {
        source,
        patterns,
        next: 0,
    }
}

/// Owns the marks placed for one buffer
pub struct Highlighter {
    patterns: PatternSet,
    style: Style,
    /// Marks created by this highlighter, keyed by line
    marks: BTreeMap<usize, (MarkId, Mark)>,
    /// Last window scanned by a re-scan
    scanned: Option<(usize, usize)>,
}

impl Highlighter {
    pub fn new(patterns: PatternSet, style: Style) -> Self {
        Self {
            patterns,
            style,
            marks: BTreeMap::new(),
            scanned: None,
        }
    }

    /// Number of marks currently placed
    #[cfg(test)]
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Marks currently placed, in line order
    #[cfg(test)]
    pub fn marks(&self) -> impl Iterator<Item = &Mark> + '_ {
        self.marks.values().map(|(_, mark)| mark)
    }

    /// Check whether a mark starts on a line
    #[cfg(test)]
    pub fn has_mark_at(&self, line: usize) -> bool {
        self.marks.contains_key(&line)
    }

    /// Window covered by the last re-scan
    #[cfg(test)]
    pub fn scanned_window(&self) -> Option<(usize, usize)> {
        self.scanned
    }

    /// Check whether the last re-scan covered lines `[top, bottom)`
    pub fn covers(&self, top: usize, bottom: usize) -> bool {
        match self.scanned {
            Some((start, end)) => start <= top && bottom <= end,
            None => false,
        }
    }

    /// Mark every error line in `[start, end)` that is not already marked
    ///
    /// Returns the marks created by this call.
    pub fn scan_and_mark<S, P>(&mut self, source: &S, start: usize, end: usize, port: &mut P) -> Vec<Mark>
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        let end = end.min(source.line_count());
        let mut created = Vec::new();
        if self.patterns.is_empty() || start >= end {
            return created;
        }

        for idx in start..end {
            if self.marks.contains_key(&idx) {
                continue;
            }
            let text = match source.line(idx) {
                Some(text) => text,
                None => break,
            };
            if !self.patterns.is_match(text) {
                continue;
            }

            let mark = Mark::whole_line(idx, text.len(), self.style);
            let id = port.add_mark(mark.clone());
            self.marks.insert(idx, (id, mark.clone()));
            created.push(mark);
        }

        debug!(start, end, created = created.len(), "scanned lines");
        created
    }

    /// Remove every mark this highlighter placed
    pub fn clear_marks<P>(&mut self, port: &mut P)
    where
        P: Presentation + ?Sized,
    {
        for (_, (id, _)) in std::mem::take(&mut self.marks) {
            port.remove_mark(id);
        }
        self.scanned = None;
    }

    /// Remove the marks on `line` and every line after it
    ///
    /// Returns the number of marks removed. The scanned window is kept, so
    /// a later re-scan is still needed to mark lines that started matching.
    pub fn clear_from<P>(&mut self, line: usize, port: &mut P) -> usize
    where
        P: Presentation + ?Sized,
    {
        let stale = self.marks.split_off(&line);
        for (id, _) in stale.values() {
            port.remove_mark(*id);
        }
        stale.len()
    }

    /// Clear and rebuild all marks around a viewport anchor
    ///
    /// Returns the number of marks placed.
    pub fn rescan<S, P>(&mut self, source: &S, anchor: usize, height: usize, port: &mut P) -> usize
    where
        S: LineSource + ?Sized,
        P: Presentation + ?Sized,
    {
        self.clear_marks(port);
        let (start, end) = viewport_bounds(anchor, height);
        let placed = self.scan_and_mark(source, start, end, port).len();
        self.scanned = Some((start, end));
        placed
    }

    /// Next or previous error line relative to `from`
    pub fn find_adjacent_match<S>(&self, source: &S, from: Position, direction: Direction) -> Option<Position>
    where
        S: LineSource + ?Sized,
    {
        find_adjacent_match(source, &self.patterns, from, direction)
    }

    /// Every error line in the buffer
    pub fn collect_all_matches<'a, S>(&'a self, source: &'a S) -> Matches<'a, S>
    where
        S: LineSource + ?Sized,
    {
        collect_all_matches(source, &self.patterns)
    }
}
