//! Configuration file support
//!
//! Loads settings from ~/.errmode.toml (or %USERPROFILE%\.errmode.toml on Windows)
//!
//! Example:
//! ```text
//! # errmode configuration
//! debounce-ms = 3000
//! line-numbers = true
//! follow = true
//! reload-interval-ms = 1000
//! tab-width = 4
//! log-file = "/tmp/errmode.log"
//!
//! [highlight]
//! fg = "bright-red"
//! bold = true
//! underline = false
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, ViewerError};
use crate::highlight::{Color, Style};

/// Configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Quiescence delay before re-scanning a changed buffer
    pub debounce_ms: u64,
    /// Whether to show line numbers
    pub line_numbers: bool,
    /// Reload the file when it changes on disk
    pub follow: bool,
    /// How often to check the file for changes
    pub reload_interval_ms: u64,
    /// Tab width for display
    pub tab_width: usize,
    /// How error lines are drawn
    pub highlight: HighlightConfig,
    /// Where to write log output (no logging when unset)
    pub log_file: Option<PathBuf>,
}

/// Error line appearance
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HighlightConfig {
    pub fg: Color,
    pub bold: bool,
    pub underline: bool,
    pub reverse: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        let style = Style::error_line();
        Self {
            fg: style.fg,
            bold: style.bold,
            underline: style.underline,
            reverse: style.reverse,
        }
    }
}

impl HighlightConfig {
    /// Mark style built from these settings
    pub fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bold: self.bold,
            underline: self.underline,
            reverse: self.reverse,
            ..Style::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 3000,
            line_numbers: false,
            follow: true,
            reload_interval_ms: 1000,
            tab_width: 8,
            highlight: HighlightConfig::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".errmode.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".errmode.toml"))
        }
    }

    /// Load configuration
    ///
    /// An explicit path must exist. The default path is optional: when it
    /// is missing the defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => match Self::load_from(path)? {
                Some(config) => Ok(config),
                None => Err(ViewerError::FileNotFound(path.display().to_string())),
            },
            None => match Self::config_path() {
                Some(path) => Ok(Self::load_from(&path)?.unwrap_or_default()),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a file, None if it does not exist
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(Self::parse(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.normalize();
        Ok(config)
    }

    /// Bring out-of-range values back into range
    fn normalize(&mut self) {
        self.debounce_ms = self.debounce_ms.max(50); // Minimum 50 ms
        self.reload_interval_ms = self.reload_interval_ms.max(100);
        self.tab_width = self.tab_width.clamp(1, 16); // Between 1 and 16
    }

    /// Debounce delay as a duration
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// File polling interval as a duration
    pub fn reload_interval(&self) -> Duration {
        Duration::from_millis(self.reload_interval_ms)
    }
}
