//! Error line commands

use crate::error::Result;
use crate::highlight::Direction;
use crate::viewer::ViewerState;
use super::CommandStatus;

/// Move to the next error line (M-n)
pub fn next_error(viewer: &mut ViewerState, _f: bool, n: i32) -> Result<CommandStatus> {
    step_errors(viewer, Direction::Forward, n)
}

/// Move to the previous error line (M-p)
pub fn previous_error(viewer: &mut ViewerState, _f: bool, n: i32) -> Result<CommandStatus> {
    step_errors(viewer, Direction::Backward, n)
}

fn step_errors(viewer: &mut ViewerState, direction: Direction, n: i32) -> Result<CommandStatus> {
    let direction = match (direction, n < 0) {
        (Direction::Forward, true) => Direction::Backward,
        (Direction::Backward, true) => Direction::Forward,
        (direction, false) => direction,
    };

    for _ in 0..n.unsigned_abs().max(1) {
        match viewer.goto_error(direction) {
            Some(pos) => viewer.display.set_message(format!("Error line {}", pos.line + 1)),
            None => {
                let msg = match direction {
                    Direction::Forward => "No further error lines",
                    Direction::Backward => "No earlier error lines",
                };
                viewer.display.set_message(msg);
                return Ok(CommandStatus::Failure);
            }
        }
    }
    Ok(CommandStatus::Success)
}

/// Collect every error line into the *Errors* listing (C-c C-e)
pub fn list_errors(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    let found = viewer.open_error_list();
    if found == 0 {
        viewer.display.set_message("No error lines");
        return Ok(CommandStatus::Failure);
    }
    viewer.display.set_message(format!("{} error lines", found));
    Ok(CommandStatus::Success)
}

/// Toggle error highlighting (C-c C-m)
pub fn toggle_error_mode(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    let enabled = viewer.toggle_mode();
    let status = if enabled {
        "Error highlighting enabled"
    } else {
        "Error highlighting disabled"
    };
    viewer.display.set_message(status);
    Ok(CommandStatus::Success)
}

/// Open the command menu (F10)
pub fn show_menu(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    viewer.open_menu();
    Ok(CommandStatus::Success)
}
