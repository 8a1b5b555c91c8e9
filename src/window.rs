//! Window representation - a viewport into a buffer

use crate::highlight::Viewport;

/// A window displaying a portion of a buffer
#[derive(Debug)]
pub struct Window {
    /// First visible line in the window
    top_line: usize,
    /// Cursor line position (0-indexed)
    cursor_line: usize,
    /// Number of text rows in window (excluding mode line)
    height: u16,
}

impl Window {
    /// Create a new window with the given height
    pub fn new(height: u16) -> Self {
        Self {
            top_line: 0,
            cursor_line: 0,
            height,
        }
    }

    /// Get the top visible line
    pub fn top_line(&self) -> usize {
        self.top_line
    }

    /// Get cursor line
    pub fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    /// Get window height in rows
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Set window height, keeping the cursor on screen
    pub fn set_height(&mut self, height: u16) {
        self.height = height.max(1);
        self.ensure_cursor_visible();
    }

    /// Lines currently on screen
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.top_line, self.height as usize)
    }

    /// Check if a line is visible in the window
    pub fn is_line_visible(&self, line: usize) -> bool {
        line >= self.top_line && line < self.top_line + self.height as usize
    }

    /// Ensure cursor is visible, adjusting top_line if needed
    pub fn ensure_cursor_visible(&mut self) {
        if self.cursor_line < self.top_line {
            self.top_line = self.cursor_line;
        } else if self.cursor_line >= self.top_line + self.height as usize {
            self.top_line = self.cursor_line + 1 - self.height as usize;
        }
    }

    /// Scroll so the cursor sits in the middle of the window
    pub fn recenter(&mut self) {
        self.top_line = self.cursor_line.saturating_sub(self.height as usize / 2);
    }

    /// Jump to a line, recentering if it is off screen
    pub fn goto_line(&mut self, line: usize, line_count: usize) {
        self.cursor_line = line.min(line_count.saturating_sub(1));
        if !self.is_line_visible(self.cursor_line) {
            self.recenter();
        }
    }

    /// Move cursor down by n lines
    pub fn move_down(&mut self, n: usize, line_count: usize) {
        let last = line_count.saturating_sub(1);
        self.cursor_line = self.cursor_line.saturating_add(n).min(last);
        self.ensure_cursor_visible();
    }

    /// Move cursor up by n lines
    pub fn move_up(&mut self, n: usize) {
        self.cursor_line = self.cursor_line.saturating_sub(n);
        self.ensure_cursor_visible();
    }

    /// Scroll forward one page, keeping two lines of context
    pub fn page_down(&mut self, line_count: usize) {
        let page = (self.height as usize).saturating_sub(2).max(1);
        let max_top = line_count.saturating_sub(1);
        self.top_line = (self.top_line + page).min(max_top);
        if self.cursor_line < self.top_line {
            self.cursor_line = self.top_line;
        }
    }

    /// Scroll backward one page, keeping two lines of context
    pub fn page_up(&mut self) {
        let page = (self.height as usize).saturating_sub(2).max(1);
        self.top_line = self.top_line.saturating_sub(page);
        let bottom = self.top_line + self.height as usize - 1;
        if self.cursor_line > bottom {
            self.cursor_line = bottom;
        }
    }

    /// Clamp the cursor after the buffer shrank
    pub fn clamp_to(&mut self, line_count: usize) {
        let last = line_count.saturating_sub(1);
        if self.cursor_line > last {
            self.cursor_line = last;
        }
        if self.top_line > last {
            self.top_line = last;
        }
        self.ensure_cursor_visible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_keeps_cursor_visible() {
        let mut window = Window::new(10);
        window.move_down(15, 100);
        assert_eq!(window.cursor_line(), 15);
        assert_eq!(window.top_line(), 6);
        assert!(window.is_line_visible(15));

        window.move_up(12);
        assert_eq!(window.cursor_line(), 3);
        assert_eq!(window.top_line(), 3);
    }

    #[test]
    fn test_move_down_stops_at_last_line() {
        let mut window = Window::new(10);
        window.move_down(500, 20);
        assert_eq!(window.cursor_line(), 19);
    }

    #[test]
    fn test_goto_line_recenters() {
        let mut window = Window::new(10);
        window.goto_line(50, 100);
        assert_eq!(window.cursor_line(), 50);
        assert_eq!(window.top_line(), 45);

        window.goto_line(48, 100);
        assert_eq!(window.top_line(), 45);
    }

    #[test]
    fn test_paging() {
        let mut window = Window::new(10);
        window.page_down(100);
        assert_eq!(window.top_line(), 8);
        assert_eq!(window.cursor_line(), 8);

        window.page_up();
        assert_eq!(window.top_line(), 0);
        assert_eq!(window.cursor_line(), 8);
    }

    #[test]
    fn test_viewport() {
        let mut window = Window::new(24);
        window.goto_line(100, 200);
        assert_eq!(window.viewport(), Viewport::new(88, 24));
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut window = Window::new(10);
        window.goto_line(80, 100);
        window.clamp_to(20);
        assert_eq!(window.cursor_line(), 19);
        assert!(window.is_line_visible(19));
    }
}
