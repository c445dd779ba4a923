//! Terminal presentation: colors and message helpers.

pub mod output_format;
pub mod theme;
