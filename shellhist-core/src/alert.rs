//! Credential alert: a persisted marker that the service refused our credential.
//!
//! Capture runs detached and can't tell anyone, so it leaves this marker
//! behind. The next operator-facing command (`flush`, `test`, `stats`,
//! `status`) reports it; a later successful authenticated call clears it.

use chrono::Utc;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::persist::write_atomic;

#[derive(Debug, Clone)]
pub struct CredentialAlert {
    path: PathBuf,
}

impl CredentialAlert {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records the refusal time. Failures are logged and otherwise ignored.
    pub fn raise(&self) {
        let now = Utc::now().to_rfc3339();
        match write_atomic(&self.path, now.as_bytes()) {
            Ok(()) => warn!("Server rejected the configured API key; alert recorded."),
            Err(e) => warn!("Could not record credential alert at {}: {}", self.path.display(), e),
        }
    }

    /// When the alert was raised, if it is pending.
    pub fn raised_at(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Some(text.trim().to_string()),
            Err(_) => None,
        }
    }

    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Credential alert cleared."),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not clear credential alert {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn raise_then_clear() {
        let dir = tempdir().unwrap();
        let alert = CredentialAlert::new(dir.path().join("auth_failed"));
        assert!(alert.raised_at().is_none());
        alert.raise();
        assert!(alert.raised_at().is_some());
        alert.clear();
        alert.clear();
        assert!(alert.raised_at().is_none());
    }
}
