//! Error pattern set
//!
//! The phrases that mark a line as an error line. They are compiled once
//! into a single alternation, so a line is tested with one regex pass
//! regardless of how many phrases the set holds.

use regex::Regex;
use tracing::warn;

use crate::error::Result;

/// Phrases that mark a line as an error line, matched verbatim
pub const BUILTIN_PATTERNS: &[&str] = &["ERROR", "WARNING", "SEVERE", "Caused by:", "nested exception is:"];

/// Immutable, precompiled union of literal phrases
///
/// Matching only takes `&self`, so a set can be shared between any
/// number of scans.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// Combined alternation (None for an empty set)
    regex: Option<Regex>,
}

impl PatternSet {
    /// Compile a pattern set from literal phrases
    pub fn new(literals: &[&str]) -> Result<Self> {
        if literals.is_empty() {
            return Ok(Self::empty());
        }

        let alternation = literals
            .iter()
            .map(|text| regex::escape(text))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&alternation)?;

        Ok(Self { regex: Some(regex) })
    }

    /// A set that matches nothing
    pub fn empty() -> Self {
        Self { regex: None }
    }

    /// The built-in error patterns
    pub fn builtin() -> Self {
        match Self::new(BUILTIN_PATTERNS) {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, "built-in patterns failed to compile; highlighting disabled");
                Self::empty()
            }
        }
    }

    /// Check whether the set has no patterns
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }

    /// Check whether any phrase occurs in text
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().map_or(false, |re| re.is_match(text))
    }
}
