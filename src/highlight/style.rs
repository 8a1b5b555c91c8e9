//! Rendering attributes for highlight marks

use serde::Deserialize;

/// Terminal colors (ANSI 16-color palette for compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold text
    pub bold: bool,
    /// Underlined text
    pub underline: bool,
    /// Reverse video (swap fg/bg)
    pub reverse: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Create a reverse video style (for selections)
    pub fn reverse() -> Self {
        Self {
            reverse: true,
            ..Default::default()
        }
    }

    /// Style used for error lines unless configured otherwise
    pub fn error_line() -> Self {
        Self::fg(Color::Red).with_bold().with_underline()
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Check if this is the default (no styling)
    #[cfg(test)]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_default() {
        let style = Style::default();
        assert!(style.is_default());
        assert_eq!(style.fg, Color::Default);
        assert!(!style.underline);
    }

    #[test]
    fn test_error_line_style() {
        let style = Style::error_line();
        assert_eq!(style.fg, Color::Red);
        assert!(style.bold);
        assert!(style.underline);
        assert!(!style.reverse);
        assert!(!style.is_default());
    }

    #[test]
    fn test_color_names() {
        #[derive(Deserialize)]
        struct Holder {
            color: Color,
        }
        let holder: Holder = toml::from_str("color = \"bright-yellow\"").unwrap();
        assert_eq!(holder.color, Color::BrightYellow);
    }
}
