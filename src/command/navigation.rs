//! Navigation commands - cursor movement

use crate::error::Result;
use crate::viewer::ViewerState;
use super::CommandStatus;

/// Move cursor to next line
pub fn next_line(viewer: &mut ViewerState, _f: bool, n: i32) -> Result<CommandStatus> {
    let count = viewer.buffer.line_count();
    let window = &mut viewer.surface.window;
    if n >= 0 {
        window.move_down(n as usize, count);
    } else {
        window.move_up(n.unsigned_abs() as usize);
    }
    Ok(CommandStatus::Success)
}

/// Move cursor to previous line
pub fn previous_line(viewer: &mut ViewerState, _f: bool, n: i32) -> Result<CommandStatus> {
    next_line(viewer, false, -n)
}

/// Scroll down (forward) one page
pub fn scroll_down(viewer: &mut ViewerState, _f: bool, n: i32) -> Result<CommandStatus> {
    let count = viewer.buffer.line_count();
    for _ in 0..n.unsigned_abs().max(1) {
        if n > 0 {
            viewer.surface.window.page_down(count);
        } else {
            viewer.surface.window.page_up();
        }
    }
    Ok(CommandStatus::Success)
}

/// Scroll up (backward) one page
pub fn scroll_up(viewer: &mut ViewerState, _f: bool, n: i32) -> Result<CommandStatus> {
    scroll_down(viewer, false, -n)
}

/// Move to beginning of buffer
pub fn beginning_of_buffer(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    let count = viewer.buffer.line_count();
    viewer.surface.window.goto_line(0, count);
    Ok(CommandStatus::Success)
}

/// Move to end of buffer
pub fn end_of_buffer(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    let count = viewer.buffer.line_count();
    viewer.surface.window.goto_line(count.saturating_sub(1), count);
    Ok(CommandStatus::Success)
}

/// Recenter display with cursor line in middle of window (C-l)
pub fn recenter(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    viewer.surface.window.recenter();
    viewer.display.force_redraw();
    Ok(CommandStatus::Success)
}

/// Toggle line numbers display
pub fn toggle_line_numbers(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    viewer.display.toggle_line_numbers();
    let status = if viewer.display.show_line_numbers {
        "Line numbers enabled"
    } else {
        "Line numbers disabled"
    };
    viewer.display.set_message(status);
    Ok(CommandStatus::Success)
}
