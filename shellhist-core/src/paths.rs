//! Resolution of the per-user files shared by every shellhist process.
//!
//! Config lives under the platform config directory; outbox, session token,
//! credential alert and diagnostic log live in a data directory in the home
//! directory. Both locations can be overridden through the environment.

use std::path::{Path, PathBuf};

use crate::errors::{HistoryError, Result};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "HISTORY_CONFIG_PATH";
/// Overrides the data directory (outbox, session, log).
pub const DATA_DIR_ENV: &str = "HISTORY_DATA_DIR";

const CONFIG_DIR_NAME: &str = "shell-history";
const CONFIG_FILE_NAME: &str = "config.json";
const DATA_DIR_NAME: &str = ".history";
const OUTBOX_FILE_NAME: &str = "buffer.json";
const SESSION_FILE_NAME: &str = "session_id";
const AUTH_ALERT_FILE_NAME: &str = "auth_failed";
const DIAGNOSTIC_LOG_FILE_NAME: &str = "agent.log";

/// The set of files one user's shells share on one machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolves paths from the environment, falling back to the home directory.
    pub fn resolve() -> Result<Self> {
        let config_file = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => {
                let home = dirs::home_dir().ok_or(HistoryError::NoHomeDirectory)?;
                home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
            }
        };
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => dirs::home_dir()
                .ok_or(HistoryError::NoHomeDirectory)?
                .join(DATA_DIR_NAME),
        };
        Ok(Self { config_file, data_dir })
    }

    /// Places everything under a single root. Used by tests and embedders.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config_file: root.join("config").join(CONFIG_FILE_NAME),
            data_dir: root.join("data"),
        }
    }

    pub fn outbox_file(&self) -> PathBuf {
        self.data_dir.join(OUTBOX_FILE_NAME)
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE_NAME)
    }

    pub fn auth_alert_file(&self) -> PathBuf {
        self.data_dir.join(AUTH_ALERT_FILE_NAME)
    }

    pub fn diagnostic_log(&self) -> PathBuf {
        self.data_dir.join(DIAGNOSTIC_LOG_FILE_NAME)
    }
}

/// Sidecar lock path for a shared file. The lock file is never renamed over,
/// so every process locks the same inode.
pub(crate) fn lock_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".lock")
}

/// Unique temp path next to `path`, on the same filesystem so `rename` stays atomic.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, &format!(".{}.tmp", uuid::Uuid::new_v4().simple()))
}

pub(crate) fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
