//! Error line highlighting
//!
//! This module provides the viewport-bounded highlighter:
//! - Marking error lines around the visible window
//! - Navigating between error lines
//! - Listing every error line in a buffer
//! - Debounced re-scans after the buffer changes

mod debounce;
mod marks;
mod mode;
mod scan;
mod style;

pub use debounce::Debouncer;
pub use marks::{
    Change, Direction, LineSource, Mark, MarkId, MarkStore, ModeCommand, Position, Presentation, Viewport,
};
pub use mode::ErrorMode;
pub use scan::{collect_all_matches, MatchLine};
pub use style::{Color, Style};
