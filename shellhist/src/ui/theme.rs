//! Colors used for terminal output.
//!
//! Every styled element of `shellhist` output maps to a [`ThemeEntry`]. The map
//! is built once per invocation and passed to the printing helpers in
//! [`crate::ui::output_format`], which only apply it when the stream is a
//! terminal.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use owo_colors::AnsiColors;

/// Type alias for the theme map, providing a consistent type definition.
pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

/// The logical parts of the output that can be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeEntry {
    /// Section titles.
    Header,
    /// Successful operation messages.
    Success,
    /// General informational messages.
    Info,
    /// Warnings, including the credential alert.
    Warn,
    /// Error messages.
    Error,
    /// Text produced by a redaction rule.
    RedactedText,
    /// Rule names in listings and previews.
    RuleName,
    /// Secondary detail such as hostnames and timestamps.
    Muted,
}

/// A named ANSI color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeColor(String);

/// Error type for parsing an invalid `ThemeColor` string.
#[derive(Debug, Clone)]
pub struct ParseThemeColorError;

impl fmt::Display for ParseThemeColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid theme color; expected one of: black, red, green, yellow, blue, \
            magenta, cyan, white, brightblack, brightred, brightgreen, brightyellow, \
            brightblue, brightmagenta, brightcyan, brightwhite."
        )
    }
}

impl std::error::Error for ParseThemeColorError {}

impl FromStr for ThemeColor {
    type Err = ParseThemeColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "black" | "red" | "green" | "yellow" | "blue" | "magenta" | "cyan" | "white" |
            "brightblack" | "brightred" | "brightgreen" | "brightyellow" | "brightblue" |
            "brightmagenta" | "brightcyan" | "brightwhite" => Ok(ThemeColor(lower)),
            _ => Err(ParseThemeColorError),
        }
    }
}

impl ThemeColor {
    pub fn to_ansi_color(&self) -> AnsiColors {
        match self.0.as_str() {
            "black" => AnsiColors::Black,
            "red" => AnsiColors::Red,
            "green" => AnsiColors::Green,
            "yellow" => AnsiColors::Yellow,
            "blue" => AnsiColors::Blue,
            "magenta" => AnsiColors::Magenta,
            "cyan" => AnsiColors::Cyan,
            "white" => AnsiColors::White,
            "brightblack" => AnsiColors::BrightBlack,
            "brightred" => AnsiColors::BrightRed,
            "brightgreen" => AnsiColors::BrightGreen,
            "brightyellow" => AnsiColors::BrightYellow,
            "brightblue" => AnsiColors::BrightBlue,
            "brightmagenta" => AnsiColors::BrightMagenta,
            "brightcyan" => AnsiColors::BrightCyan,
            "brightwhite" => AnsiColors::BrightWhite,
            _ => AnsiColors::White,
        }
    }
}

/// Style applied to one [`ThemeEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeStyle {
    pub fg: Option<ThemeColor>,
}

impl ThemeStyle {
    fn named(color: &str) -> Self {
        Self {
            fg: color.parse().ok(),
        }
    }

    pub fn default_theme_map() -> ThemeMap {
        let mut theme = HashMap::new();
        theme.insert(ThemeEntry::Header, ThemeStyle::named("brightwhite"));
        theme.insert(ThemeEntry::Success, ThemeStyle::named("green"));
        theme.insert(ThemeEntry::Info, ThemeStyle::named("cyan"));
        theme.insert(ThemeEntry::Warn, ThemeStyle::named("yellow"));
        theme.insert(ThemeEntry::Error, ThemeStyle::named("red"));
        theme.insert(ThemeEntry::RedactedText, ThemeStyle::named("magenta"));
        theme.insert(ThemeEntry::RuleName, ThemeStyle::named("brightblue"));
        theme.insert(ThemeEntry::Muted, ThemeStyle::named("brightblack"));
        theme
    }
}
