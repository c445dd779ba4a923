// shellhist/src/logger.rs
//! Logger setup for the `shellhist` binary.
//!
//! Interactive commands log to stderr. `capture` runs inside the user's prompt
//! hook, so its logger writes to the append-only diagnostic log instead and
//! nothing ever reaches the terminal.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where log records go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Appended to this file; logging is disabled if it can't be opened.
    File(PathBuf),
}

/// Initializes the global logger. `level` overrides `RUST_LOG` when set.
/// Calling it more than once is harmless.
pub fn init_logger(level: Option<LevelFilter>, target: LogTarget) {
    let default_filter = match target {
        LogTarget::Stderr => "warn",
        LogTarget::File(_) => "info",
    };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    if let Some(level) = level {
        builder.filter_level(level);
    }

    match target {
        LogTarget::Stderr => {
            builder.format_timestamp(None).format_target(false);
            builder.target(Target::Stderr);
        }
        LogTarget::File(path) => match open_append(&path) {
            Some(file) => {
                builder.format(|buf, record| {
                    writeln!(
                        buf,
                        "{} {:<5} [{}] {}",
                        buf.timestamp_millis(),
                        record.level(),
                        std::process::id(),
                        record.args()
                    )
                });
                builder.target(Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(LevelFilter::Off);
            }
        },
    }

    builder.try_init().ok();
}

fn open_append(path: &Path) -> Option<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
