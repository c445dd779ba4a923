//! Printing helpers shared by the command implementations.
//!
//! Each helper takes the writer explicitly so tests can capture output, and a
//! `supports_color` flag so styling is only emitted on terminals.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Applies the theme color for `entry` to `text` when color is enabled.
pub fn styled(text: &str, entry: ThemeEntry, theme: &ThemeMap, supports_color: bool) -> String {
    if !supports_color {
        return text.to_string();
    }
    match theme.get(&entry).and_then(|s| s.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}

pub fn print_success_message<W: Write>(
    writer: &mut W,
    msg: &str,
    theme: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    writeln!(writer, "{} {}", styled("✓", ThemeEntry::Success, theme, supports_color), msg)
}

pub fn print_info_message<W: Write>(
    writer: &mut W,
    msg: &str,
    theme: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    writeln!(writer, "{}", styled(msg, ThemeEntry::Info, theme, supports_color))
}

pub fn print_warn_message<W: Write>(
    writer: &mut W,
    msg: &str,
    theme: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    writeln!(
        writer,
        "{} {}",
        styled("Warning:", ThemeEntry::Warn, theme, supports_color),
        msg
    )
}

pub fn print_error_message<W: Write>(
    writer: &mut W,
    msg: &str,
    theme: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    writeln!(
        writer,
        "{} {}",
        styled("✗", ThemeEntry::Error, theme, supports_color),
        msg
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn plain_output_without_color() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_warn_message(&mut out, "credential refused", &theme, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Warning: credential refused\n");
    }

    #[test]
    fn colored_output_has_escape_codes() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_success_message(&mut out, "done", &theme, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\u{1b}["));
        assert!(text.ends_with("done\n"));
    }
}
