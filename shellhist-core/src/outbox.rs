//! Durable outbox: the local queue of events waiting for delivery.
//!
//! Every capture runs in its own short-lived process, so the outbox file is
//! shared mutable state across processes. Each read-modify-write holds an
//! exclusive advisory lock on a sidecar `.lock` file for its whole duration,
//! and the data file is replaced via temp file + rename. Two captures racing
//! each other therefore serialize on the lock and neither append is lost.
//!
//! A file that can't be parsed is renamed aside to
//! `buffer.json.corrupt-<unix_ms>` and the outbox continues empty. Nothing is
//! deleted, so a corrupt outbox can still be inspected afterwards.

use chrono::Utc;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{HistoryError, Result};
use crate::event::CommandEvent;
use crate::paths::sibling_with_suffix;
use crate::persist::{write_atomic, FileLock};

/// What a raw read of the outbox file produced.
enum Loaded {
    Events(Vec<CommandEvent>),
    Corrupt(String),
}

/// Crash-safe, process-safe queue persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct DurableOutbox {
    path: PathBuf,
}

impl DurableOutbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one event and persists the whole queue before returning.
    /// Returns the queue length after the append.
    pub fn enqueue(&self, event: CommandEvent) -> Result<usize> {
        self.update(|events| {
            events.push(event);
            events.len()
        })
    }

    /// Current contents in insertion order. An unreadable or corrupt file reads as empty.
    pub fn list(&self) -> Result<Vec<CommandEvent>> {
        match self.read_raw()? {
            Loaded::Events(events) => Ok(events),
            Loaded::Corrupt(reason) => {
                warn!("Outbox {} is corrupt ({}); treating it as empty.", self.path.display(), reason);
                Ok(Vec::new())
            }
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Atomically overwrites the queue with `remaining`.
    pub fn replace(&self, remaining: Vec<CommandEvent>) -> Result<()> {
        self.update(move |events| {
            *events = remaining;
        })
    }

    /// Removes the first entry equal to `event`. Entries appended by other
    /// processes since the caller's snapshot are left alone.
    /// Returns false if the entry was already gone.
    pub fn remove_delivered(&self, event: &CommandEvent) -> Result<bool> {
        self.update(|events| match events.iter().position(|e| e == event) {
            Some(index) => {
                events.remove(index);
                true
            }
            None => false,
        })
    }

    /// Locked read-modify-write.
    fn update<T>(&self, f: impl FnOnce(&mut Vec<CommandEvent>) -> T) -> Result<T> {
        let _lock = FileLock::exclusive(&self.path).map_err(|e| self.io_err(e))?;
        let mut events = match self.read_raw()? {
            Loaded::Events(events) => events,
            Loaded::Corrupt(reason) => {
                self.quarantine(&reason)?;
                Vec::new()
            }
        };
        let out = f(&mut events);
        let json = serde_json::to_vec_pretty(&events)?;
        write_atomic(&self.path, &json).map_err(|e| self.io_err(e))?;
        debug!("Outbox {} now holds {} event(s).", self.path.display(), events.len());
        Ok(out)
    }

    fn read_raw(&self) -> Result<Loaded> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Loaded::Events(Vec::new())),
            Err(e) => return Ok(Loaded::Corrupt(format!("unreadable: {}", e))),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Loaded::Events(Vec::new()));
        }
        match serde_json::from_slice::<Vec<CommandEvent>>(&bytes) {
            Ok(events) => Ok(Loaded::Events(events)),
            Err(e) => Ok(Loaded::Corrupt(e.to_string())),
        }
    }

    /// Moves a corrupt outbox out of the way so the next write doesn't destroy it.
    fn quarantine(&self, reason: &str) -> Result<()> {
        let suffix = format!(".corrupt-{}", Utc::now().timestamp_millis());
        let aside = sibling_with_suffix(&self.path, &suffix);
        fs::rename(&self.path, &aside).map_err(|e| self.io_err(e))?;
        warn!(
            "Outbox {} was corrupt ({}); preserved as {} and starting empty.",
            self.path.display(),
            reason,
            aside.display()
        );
        Ok(())
    }

    fn io_err(&self, e: std::io::Error) -> HistoryError {
        HistoryError::Outbox(self.path.clone(), e)
    }
}
