//! The record sent to the collection service and stored in the outbox.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One captured shell command plus its metadata, post-redaction.
///
/// Immutable once built, except that [`CommandEvent::stamped`] adds the
/// capture time when the event is buffered. Live submissions carry no
/// timestamp and the server assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    pub command: String,
    pub hostname: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_username: Option<String>,
    #[serde(default)]
    pub cwd: String,
    /// Absent when the hook did not report an exit status.
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub redacted: bool,
}

impl CommandEvent {
    /// Returns the event with `timestamp` set to `at`, unless it already has one.
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        if self.timestamp.is_none() {
            self.timestamp = Some(format_timestamp(at));
        }
        self
    }
}

/// RFC 3339 UTC with microsecond precision, e.g. `2026-01-02T03:04:05.123456Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
