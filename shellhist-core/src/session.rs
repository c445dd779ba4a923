//! Session identity: one opaque token shared by all of a user's shells on one machine.
//!
//! The token is created lazily by whichever process needs it first. Several
//! shells can start at the same instant, so creation publishes the token with
//! a hard link, which fails if the target exists. The loser of that race drops
//! its own token and reads the winner's.

use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::errors::{HistoryError, Result};
use crate::paths::temp_path_for;

/// Resolves the session token stored at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    path: PathBuf,
}

impl SessionIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the existing token, or creates one if none exists yet.
    pub fn resolve(&self) -> Result<String> {
        self.resolve_inner()
            .map_err(|e| HistoryError::Session(self.path.clone(), e))
    }

    /// Reads the token without creating it.
    pub fn current(&self) -> Option<String> {
        read_token(&self.path).ok().flatten()
    }

    fn resolve_inner(&self) -> std::io::Result<String> {
        if let Some(token) = read_token(&self.path)? {
            return Ok(token);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let candidate = uuid::Uuid::new_v4().to_string();
        let tmp = temp_path_for(&self.path);
        {
            let mut file = OpenOptions::new().create_new(true).write(true).open(&tmp)?;
            file.write_all(candidate.as_bytes())?;
            file.sync_all()?;
        }

        let published = match fs::hard_link(&tmp, &self.path) {
            Ok(()) => {
                debug!("Created session identity at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if read_token(&self.path)?.is_none() {
                    // An empty file is left over from an interrupted writer.
                    warn!("Replacing empty session file at {}", self.path.display());
                    fs::rename(&tmp, &self.path)?;
                }
                Ok(())
            }
            Err(e) => Err(e),
        };
        let _ = fs::remove_file(&tmp);
        published?;

        // Whoever won the race, the file now holds the token everyone uses.
        match read_token(&self.path)? {
            Some(token) => Ok(token),
            None => Err(std::io::Error::new(
                ErrorKind::InvalidData,
                "session file is empty after creation",
            )),
        }
    }
}

fn read_token(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let token = text.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
