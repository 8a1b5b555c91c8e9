//! Miscellaneous commands

use std::time::Instant;

use crate::error::Result;
use crate::viewer::ViewerState;
use super::CommandStatus;

/// Quit the viewer
pub fn quit(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    viewer.running = false;
    Ok(CommandStatus::Success)
}

/// Abort the current operation (C-g)
pub fn abort(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    viewer.input.reset();
    viewer.menu = None;
    Ok(CommandStatus::Abort)
}

/// Re-read the file now, without waiting for the poll interval
pub fn revert_buffer(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    if viewer.buffer.filename().is_none() {
        viewer.display.set_message("Buffer has no file");
        return Ok(CommandStatus::Failure);
    }
    if viewer.check_reload(Instant::now()) {
        viewer.display.set_message("Reverted");
    } else {
        viewer.display.set_message("File unchanged");
    }
    Ok(CommandStatus::Success)
}

/// Toggle following the file as it grows
pub fn toggle_follow(viewer: &mut ViewerState, _f: bool, _n: i32) -> Result<CommandStatus> {
    viewer.follow = !viewer.follow;
    let status = if viewer.follow {
        "Following file"
    } else {
        "Not following file"
    };
    viewer.display.set_message(status);
    Ok(CommandStatus::Success)
}
