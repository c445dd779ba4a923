// shellhist-core/src/capture.rs
//! The capture path: what runs once per shell command, detached from the shell.
//!
//! Capture never reports failure to its caller. Every outcome is either a
//! delivered event, a buffered event, or a logged no-op. The one thing it will
//! not do is send or store an unredacted command: if the configuration can't
//! be read, the rules can't be known, and the event is dropped.
//!
//! License: MIT OR APACHE 2.0

use chrono::Utc;
use log::{debug, info, warn};
use std::env;

use crate::alert::CredentialAlert;
use crate::config::{Config, ConfigOverrides, ConfigStore, EnvValues};
use crate::engine::RuleEngine;
use crate::event::CommandEvent;
use crate::outbox::DurableOutbox;
use crate::paths::Paths;
use crate::session::SessionIdentity;
use crate::sink::http::{HttpSink, CAPTURE_TIMEOUT};
use crate::sink::{RemoteSink, SubmitOutcome};

const UNKNOWN: &str = "unknown";

/// What the shell hook reports about one finished command.
#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    pub command: String,
    pub exit_code: Option<i32>,
    /// Falls back to the process working directory when absent.
    pub cwd: Option<String>,
}

/// Machine and user facts attached to every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub hostname: String,
    pub username: String,
    /// The invoking user under sudo.
    pub alt_username: Option<String>,
    pub cwd: String,
}

impl HostContext {
    /// Reads hostname, `USER`, `SUDO_USER` and the working directory.
    pub fn from_environment() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let username = env::var("USER")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let alt_username = env::var("SUDO_USER").ok().filter(|u| !u.is_empty());
        let cwd = env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            hostname,
            username,
            alt_username,
            cwd,
        }
    }
}

/// How a capture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureReport {
    /// Sent live; nothing stored locally.
    Delivered { redacted: bool },
    /// Stored in the outbox after the live attempt failed.
    Buffered { outcome: SubmitOutcome, queued: usize },
    /// Neither sent nor stored.
    Dropped(String),
}

/// Runs one capture against the on-disk state rooted at [`Paths`].
#[derive(Debug, Clone)]
pub struct CaptureCoordinator {
    paths: Paths,
    overrides: ConfigOverrides,
    env: EnvValues,
    host: HostContext,
}

impl CaptureCoordinator {
    pub fn new(paths: Paths, overrides: ConfigOverrides) -> Self {
        Self {
            paths,
            overrides,
            env: EnvValues::from_process(),
            host: HostContext::from_environment(),
        }
    }

    pub fn with_env(mut self, env: EnvValues) -> Self {
        self.env = env;
        self
    }

    pub fn with_host(mut self, host: HostContext) -> Self {
        self.host = host;
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Loads the effective configuration, or `None` if the file is unusable.
    pub fn load_config(&self) -> Option<Config> {
        let store = ConfigStore::new(&self.paths.config_file);
        match store.load_with_env(&self.overrides, &self.env) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Capture skipped, configuration unusable: {}", e);
                None
            }
        }
    }

    /// Full capture against the configured HTTP service.
    pub fn capture(&self, request: &CaptureRequest) -> (CaptureReport, Option<Config>) {
        let config = match self.load_config() {
            Some(config) => config,
            None => return (CaptureReport::Dropped("configuration unusable".to_string()), None),
        };
        let report = match HttpSink::from_config(&config, CAPTURE_TIMEOUT) {
            Ok(sink) => self.capture_with(&config, request, &sink),
            Err(e) => {
                warn!("Could not build HTTP client: {}", e);
                self.capture_with(&config, request, &Unavailable(e.to_string()))
            }
        };
        (report, Some(config))
    }

    /// Capture with an explicit configuration and sink.
    pub fn capture_with<S: RemoteSink>(
        &self,
        config: &Config,
        request: &CaptureRequest,
        sink: &S,
    ) -> CaptureReport {
        let engine = RuleEngine::new(&config.redaction_rules);
        let redaction = engine.redact(&request.command);

        let session_id = match SessionIdentity::new(self.paths.session_file()).resolve() {
            Ok(id) => id,
            Err(e) => {
                warn!("Session identity unavailable: {}", e);
                String::new()
            }
        };

        let cwd = request
            .cwd
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.host.cwd.clone());

        let event = CommandEvent {
            command: redaction.text,
            hostname: self.host.hostname.clone(),
            username: self.host.username.clone(),
            alt_username: self.host.alt_username.clone(),
            cwd,
            exit_code: request.exit_code,
            session_id,
            timestamp: None,
            redacted: redaction.redacted,
        };

        let alert = CredentialAlert::new(self.paths.auth_alert_file());
        let outcome = sink.submit(&event);
        match outcome {
            SubmitOutcome::Delivered => {
                debug!("Command delivered live (redacted: {}).", event.redacted);
                alert.clear();
                return CaptureReport::Delivered {
                    redacted: event.redacted,
                };
            }
            SubmitOutcome::Unauthorized => alert.raise(),
            SubmitOutcome::Rejected(ref reason) => {
                warn!("Service rejected the event, buffering for one retry: {}", reason)
            }
            SubmitOutcome::Transient(ref reason) => {
                info!("Live delivery failed, buffering: {}", reason)
            }
        }

        let outbox = DurableOutbox::new(self.paths.outbox_file());
        match outbox.enqueue(event.stamped(Utc::now())) {
            Ok(queued) => CaptureReport::Buffered { outcome, queued },
            Err(e) => {
                warn!("Event lost, outbox write failed: {}", e);
                CaptureReport::Dropped(e.to_string())
            }
        }
    }
}

/// Stands in when no HTTP client could be built; every attempt is transient.
struct Unavailable(String);

impl RemoteSink for Unavailable {
    fn submit(&self, _event: &CommandEvent) -> SubmitOutcome {
        SubmitOutcome::Transient(self.0.clone())
    }
}
