//! Display rendering

use unicode_width::UnicodeWidthChar;

use crate::buffer::Buffer;
use crate::error::Result;
use crate::highlight::Style;
use crate::terminal::Terminal;
use crate::viewer::{ErrorList, Menu, View, ViewSurface};

/// Everything a frame is drawn from
pub struct Frame<'a> {
    pub buffer: &'a Buffer,
    pub surface: &'a ViewSurface,
    pub view: &'a View,
    pub menu: Option<&'a Menu>,
    pub mode_enabled: bool,
    pub follow: bool,
}

/// A run of text drawn with one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Option<Style>,
}

/// Display state
pub struct Display {
    /// Whether a full redraw is needed
    needs_redraw: bool,
    /// Message to show in minibuffer (bottom line)
    message: Option<String>,
    /// Whether to show line numbers
    pub show_line_numbers: bool,
    /// Columns per tab stop
    tab_width: usize,
}

impl Display {
    pub fn new(show_line_numbers: bool, tab_width: usize) -> Self {
        Self {
            needs_redraw: true,
            message: None,
            show_line_numbers,
            tab_width: tab_width.max(1),
        }
    }

    /// Toggle line numbers on/off
    pub fn toggle_line_numbers(&mut self) {
        self.show_line_numbers = !self.show_line_numbers;
        self.needs_redraw = true;
    }

    /// Calculate width needed for line numbers (including separator)
    fn line_number_width(&self, line_count: usize) -> usize {
        if !self.show_line_numbers {
            return 0;
        }
        line_count.max(1).to_string().len().max(3) + 1 // minimum 3 digits + space
    }

    /// Mark that a full redraw is needed
    pub fn force_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Set a message to display
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    /// Clear the message
    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Current message, if any
    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Render a full frame
    pub fn render(&mut self, terminal: &mut Terminal, frame: &Frame<'_>) -> Result<()> {
        let cols = terminal.cols() as usize;
        let rows = terminal.rows();

        if self.needs_redraw {
            terminal.clear_screen()?;
        }
        terminal.set_cursor_visible(false)?;

        let window = &frame.surface.window;
        let height = window.height() as usize;

        match frame.view {
            View::File => self.render_file(terminal, frame, cols)?,
            View::Errors(list) => self.render_error_list(terminal, list, height, cols)?,
        }

        self.render_mode_line(terminal, frame, height as u16, cols)?;
        self.render_minibuffer(terminal, rows.saturating_sub(1), cols)?;

        if let Some(menu) = frame.menu {
            self.render_menu(terminal, menu, cols)?;
        } else if let View::File = frame.view {
            self.position_cursor(terminal, frame)?;
            terminal.set_cursor_visible(true)?;
        }

        terminal.flush()?;
        self.needs_redraw = false;
        Ok(())
    }

    /// Render the file window with error marks
    fn render_file(&self, terminal: &mut Terminal, frame: &Frame<'_>, cols: usize) -> Result<()> {
        let window = &frame.surface.window;
        let lnum_width = self.line_number_width(frame.buffer.line_count());
        let text_cols = cols.saturating_sub(lnum_width);

        for row_offset in 0..window.height() as usize {
            let line_idx = window.top_line() + row_offset;
            terminal.move_cursor(row_offset as u16, 0)?;

            match frame.buffer.line(line_idx) {
                Some(text) => {
                    if self.show_line_numbers {
                        terminal.set_dim(true)?;
                        terminal.write_str(&format!("{:>width$} ", line_idx + 1, width = lnum_width - 1))?;
                        terminal.set_dim(false)?;
                    }

                    let spans: Vec<(usize, usize, Style)> = frame
                        .surface
                        .marks
                        .on_line(line_idx)
                        .filter_map(|m| m.span_on(line_idx, text.len()).map(|(s, e)| (s, e, m.style)))
                        .collect();

                    for segment in layout_line(text, &spans, self.tab_width, text_cols) {
                        write_segment(terminal, &segment)?;
                    }
                }
                None => {
                    // Empty line indicator (like vim's ~)
                    terminal.set_dim(true)?;
                    terminal.write_str("~")?;
                    terminal.set_dim(false)?;
                }
            }

            terminal.clear_to_eol()?;
        }

        Ok(())
    }

    /// Render the *Errors* listing
    fn render_error_list(&self, terminal: &mut Terminal, list: &ErrorList, height: usize, cols: usize) -> Result<()> {
        for row_offset in 0..height {
            terminal.move_cursor(row_offset as u16, 0)?;

            if let Some(entry) = list.entries.get(list.top + row_offset) {
                let text = format!("{:>6}: {}", entry.line + 1, entry.text);
                let is_selected = list.top + row_offset == list.selected;
                let segment = Segment {
                    text: expand_to_width(&text, self.tab_width, cols),
                    style: is_selected.then(Style::reverse),
                };
                write_segment(terminal, &segment)?;
            }

            terminal.clear_to_eol()?;
        }
        Ok(())
    }

    /// Render the mode line
    fn render_mode_line(&self, terminal: &mut Terminal, frame: &Frame<'_>, row: u16, cols: usize) -> Result<()> {
        terminal.move_cursor(row, 0)?;
        terminal.set_reverse(true)?;

        let mode_line = match frame.view {
            View::File => file_mode_line(frame),
            View::Errors(list) => format!(
                "-- errmode: *Errors* ({} lines from {}) --",
                list.entries.len(),
                frame.buffer.name()
            ),
        };

        // Pad or truncate to fill width
        let padded = if mode_line.len() < cols {
            format!("{}{}", mode_line, "-".repeat(cols - mode_line.len()))
        } else {
            truncate_to_width(&mode_line, cols)
        };

        terminal.write_str(&padded)?;
        terminal.set_reverse(false)?;
        Ok(())
    }

    /// Render the minibuffer (message area)
    fn render_minibuffer(&self, terminal: &mut Terminal, row: u16, cols: usize) -> Result<()> {
        terminal.move_cursor(row, 0)?;

        if let Some(ref msg) = self.message {
            terminal.write_str(&truncate_to_width(msg, cols))?;
        }

        terminal.clear_to_eol()?;
        Ok(())
    }

    /// Render the command menu over the top left of the window
    fn render_menu(&self, terminal: &mut Terminal, menu: &Menu, cols: usize) -> Result<()> {
        let label_width = menu.items.iter().map(|i| i.label.len()).max().unwrap_or(0);
        let key_width = menu.items.iter().map(|i| i.key.len()).max().unwrap_or(0);
        let inner = label_width + key_width + 4;

        let border = format!("+{}+", "-".repeat(inner));
        terminal.move_cursor(0, 0)?;
        terminal.write_str(&truncate_to_width(&border, cols))?;

        for (i, item) in menu.items.iter().enumerate() {
            terminal.move_cursor(i as u16 + 1, 0)?;
            terminal.write_str("|")?;
            let body = format!(" {:<lw$}  {:>kw$} ", item.label, item.key, lw = label_width, kw = key_width);
            if i == menu.selected {
                terminal.set_reverse(true)?;
                terminal.write_str(&truncate_to_width(&body, cols.saturating_sub(2)))?;
                terminal.set_reverse(false)?;
            } else {
                terminal.write_str(&truncate_to_width(&body, cols.saturating_sub(2)))?;
            }
            terminal.write_str("|")?;
        }

        terminal.move_cursor(menu.items.len() as u16 + 1, 0)?;
        terminal.write_str(&truncate_to_width(&border, cols))?;
        Ok(())
    }

    /// Position the hardware cursor on the cursor line
    fn position_cursor(&self, terminal: &mut Terminal, frame: &Frame<'_>) -> Result<()> {
        let window = &frame.surface.window;
        let screen_row = window.cursor_line().saturating_sub(window.top_line()) as u16;
        let screen_col = self
            .line_number_width(frame.buffer.line_count())
            .min(terminal.cols().saturating_sub(1) as usize) as u16;
        terminal.move_cursor(screen_row, screen_col)
    }
}

/// Mode line text for the file view
fn file_mode_line(frame: &Frame<'_>) -> String {
    let buffer = frame.buffer;
    let window = &frame.surface.window;
    let filename = buffer
        .filename()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "no file".to_string());

    let line_count = buffer.line_count();
    let cursor_line = window.cursor_line() + 1;
    let percent = if line_count <= window.height() as usize {
        "All".to_string()
    } else if cursor_line == 1 {
        "Top".to_string()
    } else if cursor_line >= line_count {
        "Bot".to_string()
    } else {
        format!("{}%", cursor_line * 100 / line_count)
    };

    let mut modes = Vec::new();
    if frame.mode_enabled {
        modes.push(format!("Err:{}", frame.surface.marks.len()));
    }
    if frame.follow {
        modes.push("Follow".to_string());
    }

    format!(
        "-- errmode: {} ({}) L{} {} ({}) --",
        buffer.name(),
        filename,
        cursor_line,
        percent,
        modes.join(" ")
    )
}

fn write_segment(terminal: &mut Terminal, segment: &Segment) -> Result<()> {
    match &segment.style {
        Some(style) => {
            terminal.apply_style(style)?;
            terminal.write_str(&segment.text)?;
            terminal.reset_attributes()
        }
        None => terminal.write_str(&segment.text),
    }
}

/// Split a line into styled runs that fit in `max_cols` display columns
///
/// `spans` are byte ranges into `text`; the first span covering a byte wins.
/// Tabs are expanded and other control characters drawn as `?`.
pub fn layout_line(text: &str, spans: &[(usize, usize, Style)], tab_width: usize, max_cols: usize) -> Vec<Segment> {
    let tab_width = tab_width.max(1);
    let mut segments: Vec<Segment> = Vec::new();
    let mut col = 0;

    for (pos, ch) in text.char_indices() {
        let style = spans
            .iter()
            .find(|(start, end, _)| pos >= *start && pos < *end)
            .map(|(_, _, style)| *style);

        let (piece, width) = if ch == '\t' {
            let n = tab_width - col % tab_width;
            (" ".repeat(n), n)
        } else if ch.is_control() {
            ("?".to_string(), 1)
        } else {
            (ch.to_string(), UnicodeWidthChar::width(ch).unwrap_or(0))
        };

        if col + width > max_cols {
            break;
        }
        col += width;

        match segments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&piece),
            _ => segments.push(Segment { text: piece, style }),
        }
    }

    segments
}

/// Expand tabs and truncate to a display width
fn expand_to_width(s: &str, tab_width: usize, max_width: usize) -> String {
    layout_line(s, &[], tab_width, max_width)
        .into_iter()
        .map(|segment| segment.text)
        .collect()
}

/// Truncate a string to fit within a display width
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut width = 0;

    for ch in s.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if width + ch_width > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result
}
