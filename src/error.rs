//! Error types for errmode

use thiserror::Error;

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Viewer error types
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),
}
