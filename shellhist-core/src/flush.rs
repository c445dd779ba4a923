// shellhist-core/src/flush.rs
//! The flush pass: drains the outbox by retrying each buffered event once.
//!
//! The outbox lock is never held across a network call. The pass works from a
//! snapshot and removes each delivered entry with its own locked
//! read-modify-write, so captures that land mid-flush are kept.
//!
//! Only one pass runs at a time per outbox. A pass that finds the
//! `buffer.json.flush.lock` guard taken returns at once without submitting.

use log::{debug, info, warn};
use rand::Rng;

use crate::alert::CredentialAlert;
use crate::errors::{HistoryError, Result};
use crate::outbox::DurableOutbox;
use crate::paths::sibling_with_suffix;
use crate::persist::FileLock;
use crate::sink::{RemoteSink, SubmitOutcome};

/// Aggregate result of one flush pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub sent: usize,
    /// Entries still buffered when the pass ended.
    pub remaining: usize,
    /// Entries discarded after a second rejection.
    pub dropped: usize,
    /// The pass stopped because the credential was refused.
    pub unauthorized: bool,
    /// Another pass held the flush guard; nothing was submitted.
    pub already_running: bool,
}

/// Rolls the per-capture flush dice.
pub fn should_flush(probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rand::rng().random_bool(probability)
}

pub struct FlushCoordinator<'a> {
    outbox: &'a DurableOutbox,
    alert: &'a CredentialAlert,
}

impl<'a> FlushCoordinator<'a> {
    pub fn new(outbox: &'a DurableOutbox, alert: &'a CredentialAlert) -> Self {
        Self { outbox, alert }
    }

    /// Runs one pass. Only failure to read the outbox at all is an error.
    pub fn flush<S: RemoteSink>(&self, sink: &S) -> Result<FlushSummary> {
        let guard_target = sibling_with_suffix(self.outbox.path(), ".flush");
        let Some(_guard) = FileLock::try_exclusive(&guard_target)
            .map_err(|e| HistoryError::Outbox(guard_target.clone(), e))?
        else {
            debug!("Another flush is already running, skipping this one.");
            return Ok(FlushSummary {
                already_running: true,
                remaining: self.outbox.len()?,
                ..FlushSummary::default()
            });
        };

        let snapshot = self.outbox.list()?;
        let mut summary = FlushSummary::default();
        if snapshot.is_empty() {
            debug!("Outbox empty, nothing to flush.");
            return Ok(summary);
        }
        info!("Flushing {} buffered event(s).", snapshot.len());

        for event in &snapshot {
            match sink.submit(event) {
                SubmitOutcome::Delivered => match self.outbox.remove_delivered(event) {
                    Ok(true) => summary.sent += 1,
                    Ok(false) => debug!("Delivered event was already gone from the outbox."),
                    // It stays buffered and will be sent again next pass.
                    Err(e) => warn!("Delivered event could not be removed from outbox: {}", e),
                },
                SubmitOutcome::Transient(reason) => {
                    debug!("Retaining buffered event: {}", reason);
                }
                SubmitOutcome::Rejected(reason) => {
                    warn!("Dropping buffered event rejected again by the service: {}", reason);
                    match self.outbox.remove_delivered(event) {
                        Ok(true) => summary.dropped += 1,
                        Ok(false) => debug!("Rejected event was already gone from the outbox."),
                        Err(e) => warn!("Rejected event could not be removed from outbox: {}", e),
                    }
                }
                SubmitOutcome::Unauthorized => {
                    summary.unauthorized = true;
                    self.alert.raise();
                    break;
                }
            }
        }

        if summary.sent > 0 && !summary.unauthorized {
            self.alert.clear();
        }

        summary.remaining = match self.outbox.len() {
            Ok(n) => n,
            Err(e) => {
                warn!("Could not re-read outbox after flush: {}", e);
                snapshot.len().saturating_sub(summary.sent + summary.dropped)
            }
        };
        info!(
            "Flush finished: {} sent, {} dropped, {} remaining{}.",
            summary.sent,
            summary.dropped,
            summary.remaining,
            if summary.unauthorized { ", stopped on refused credential" } else { "" }
        );
        Ok(summary)
    }
}
