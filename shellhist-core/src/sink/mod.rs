//! The network contract the capture and flush paths depend on.
//!
//! Everything above this module sees delivery as a single call with four
//! possible outcomes. The production implementation is [`http::HttpSink`];
//! tests substitute scripted sinks.

use crate::event::CommandEvent;

pub mod http;

/// How one submission attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service accepted the event; drop it locally.
    Delivered,
    /// Network or server-side failure; safe to buffer and retry.
    Transient(String),
    /// The service refused the event as malformed; retrying won't help.
    Rejected(String),
    /// The credential was refused; retrying with it will never succeed.
    Unauthorized,
}

impl SubmitOutcome {
    /// Short label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::Delivered => "delivered",
            SubmitOutcome::Transient(_) => "transient",
            SubmitOutcome::Rejected(_) => "rejected",
            SubmitOutcome::Unauthorized => "unauthorized",
        }
    }
}

/// Delivers one event to the collection service.
pub trait RemoteSink {
    fn submit(&self, event: &CommandEvent) -> SubmitOutcome;
}

impl<S: RemoteSink + ?Sized> RemoteSink for &S {
    fn submit(&self, event: &CommandEvent) -> SubmitOutcome {
        (**self).submit(event)
    }
}

impl<S: RemoteSink + ?Sized> RemoteSink for Box<S> {
    fn submit(&self, event: &CommandEvent) -> SubmitOutcome {
        (**self).submit(event)
    }
}

/// Maps an HTTP status code onto a submission outcome.
pub fn classify_status(status: u16, body: &str) -> SubmitOutcome {
    match status {
        200..=299 => SubmitOutcome::Delivered,
        401 | 403 => SubmitOutcome::Unauthorized,
        408 | 429 => SubmitOutcome::Transient(format!("HTTP {}", status)),
        400..=499 => SubmitOutcome::Rejected(format!("HTTP {}: {}", status, truncate(body, 200))),
        _ => SubmitOutcome::Transient(format!("HTTP {}", status)),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
