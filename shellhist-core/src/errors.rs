//! errors.rs - Custom error types for the shellhist-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//! The capture path never surfaces these to the shell; they exist so that
//! management commands and the flush summary can report what went wrong.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// All possible error types in the `shellhist-core` library.
///
/// `#[non_exhaustive]` lets new variants be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("Could not determine a home directory for configuration and data files")]
    NoHomeDirectory,

    #[error("Failed to read configuration file {0}: {1}")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration file {0}: {1}")]
    ConfigParse(PathBuf, #[source] serde_json::Error),

    #[error("A redaction rule named '{0}' already exists")]
    DuplicateRule(String),

    #[error("No redaction rule named '{0}' found")]
    UnknownRule(String),

    #[error("Rule '{0}' is invalid: {1}")]
    InvalidRule(String, String),

    #[error("Failed to compile redaction rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Outbox at {0} could not be accessed: {1}")]
    Outbox(PathBuf, #[source] std::io::Error),

    #[error("Session identity at {0} could not be resolved: {1}")]
    Session(PathBuf, #[source] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server refused the credential (HTTP {0})")]
    Unauthorized(u16),

    #[error("Server returned status {0}")]
    UnexpectedStatus(u16),

    #[error("Failed to serialize data: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = HistoryError> = std::result::Result<T, E>;
