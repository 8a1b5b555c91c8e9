//! Buffer representation - the lines of the file being viewed

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Result, ViewerError};
use crate::highlight::{Change, LineSource};

/// File state seen at the last load, used to detect changes on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DiskStamp {
    len: u64,
    modified: Option<SystemTime>,
}

/// A read-only buffer of lines
#[derive(Debug)]
pub struct Buffer {
    /// Lines of text, without terminators
    lines: Vec<String>,
    /// Buffer name (e.g., "app.log", "*scratch*")
    name: String,
    /// Associated file path (None for unnamed buffers)
    filename: Option<PathBuf>,
    /// Size and mtime at the last load
    stamp: Option<DiskStamp>,
}

impl Buffer {
    /// Create a new empty buffer with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            name: name.into(),
            filename: None,
            stamp: None,
        }
    }

    /// Create a buffer from in-memory lines
    #[cfg(test)]
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::new(name)
        }
    }

    /// Create a buffer from file contents
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        let (lines, stamp) = read_file(path)?;

        Ok(Self {
            lines,
            filename: Some(path.to_path_buf()),
            stamp: Some(stamp),
            ..Self::new(name)
        })
    }

    /// Get buffer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get filename if set
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Get number of lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get a line by index
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Get all lines
    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Replace the buffer contents, reporting which lines changed
    ///
    /// Lines shared with the old contents at the top are left out of the
    /// reported range. Returns None if nothing changed.
    pub fn replace_lines(&mut self, lines: Vec<String>) -> Option<Change> {
        let start = self
            .lines
            .iter()
            .zip(&lines)
            .take_while(|(old, new)| old == new)
            .count();
        let end = self.lines.len().max(lines.len());
        self.lines = lines;

        if start == end {
            None
        } else {
            Some(Change::new(start, end))
        }
    }

    /// Check whether the backing file differs from what was loaded
    pub fn changed_on_disk(&self) -> Result<bool> {
        let path = match &self.filename {
            Some(path) => path,
            None => return Ok(false),
        };
        let current = stamp(path)?;
        Ok(self.stamp != Some(current))
    }

    /// Re-read the backing file if it changed
    ///
    /// Returns the changed line range, or None when the file is unchanged.
    pub fn reload(&mut self) -> Result<Option<Change>> {
        if !self.changed_on_disk()? {
            return Ok(None);
        }
        let path = match &self.filename {
            Some(path) => path.clone(),
            None => return Ok(None),
        };

        let (lines, stamp) = read_file(&path)?;
        self.stamp = Some(stamp);
        Ok(self.replace_lines(lines))
    }
}

impl LineSource for Buffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }
}

/// Read a file as lossy UTF-8 lines
fn read_file(path: &Path) -> Result<(Vec<String>, DiskStamp)> {
    let bytes = fs::read(path).map_err(|e| not_found(path, e))?;
    let stamp = stamp(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let lines = content.lines().map(str::to_string).collect();
    Ok((lines, stamp))
}

fn stamp(path: &Path) -> Result<DiskStamp> {
    let meta = fs::metadata(path).map_err(|e| not_found(path, e))?;
    Ok(DiskStamp {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}

fn not_found(path: &Path, e: std::io::Error) -> ViewerError {
    if e.kind() == ErrorKind::NotFound {
        ViewerError::FileNotFound(path.display().to_string())
    } else {
        ViewerError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    #[test]
    fn test_from_lines() {
        let buffer = Buffer::from_lines("log", ["a", "b"]);
        assert_eq!(buffer.name(), "log");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line(1), Some("b"));
        assert_eq!(buffer.line(2), None);
        assert!(buffer.filename().is_none());
    }

    #[test]
    fn test_replace_reports_changed_tail() {
        let mut buffer = Buffer::from_lines("log", ["a", "b", "c"]);
        assert_eq!(
            buffer.replace_lines(vec!["a".into(), "x".into()]),
            Some(Change::new(1, 3))
        );
        assert_eq!(buffer.replace_lines(vec!["a".into(), "x".into()]), None);
    }

    #[test]
    fn test_replace_reports_appended_lines() {
        let mut buffer = Buffer::from_lines("log", ["a"]);
        assert_eq!(
            buffer.replace_lines(vec!["a".into(), "b".into(), "c".into()]),
            Some(Change::new(1, 3))
        );
        assert_eq!(buffer.lines(), &["a", "b", "c"]);
    }

    #[test]
    fn test_from_file_handles_crlf_and_bad_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"INFO one\r\nERROR \xff two\n").unwrap();

        let buffer = Buffer::from_file(file.path()).unwrap();
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line(0), Some("INFO one"));
        assert!(buffer.line(1).unwrap().starts_with("ERROR "));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Buffer::from_file(&dir.path().join("gone.log")).unwrap_err();
        assert!(matches!(err, ViewerError::FileNotFound(_)));
    }

    #[test]
    fn test_reload_after_append() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "INFO start").unwrap();
        file.flush().unwrap();

        let mut buffer = Buffer::from_file(file.path()).unwrap();
        assert_eq!(buffer.reload().unwrap(), None);

        let mut appender = OpenOptions::new().append(true).open(file.path()).unwrap();
        writeln!(appender, "ERROR disk full").unwrap();
        appender.flush().unwrap();

        assert_eq!(buffer.reload().unwrap(), Some(Change::new(1, 2)));
        assert_eq!(buffer.line(1), Some("ERROR disk full"));
    }
}
