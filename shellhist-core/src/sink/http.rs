// shellhist-core/src/sink/http.rs
//! Blocking HTTP client for the collection service.
//!
//! Submission goes through [`RemoteSink`]; the health, stats and search calls
//! back the interactive `test`, `stats` and `search` commands.

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{HistoryError, Result};
use crate::event::CommandEvent;
use crate::sink::{classify_status, RemoteSink, SubmitOutcome};

/// Budget for the single live attempt made while the shell waits on nothing.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(3);
/// Budget per event during a flush pass.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const API_KEY_HEADER: &str = "X-API-Key";
const COMMANDS_PATH: &str = "/api/v1/commands/";
const STATS_PATH: &str = "/api/v1/stats/";
const HEALTH_PATH: &str = "/health";

/// Remote totals reported by the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteStats {
    #[serde(default)]
    pub total_commands: Option<u64>,
    #[serde(default)]
    pub active_hosts: Option<u64>,
    #[serde(default)]
    pub storage_used: Option<String>,
}

/// One row of a search response. The service may omit any field but the command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub command: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<HistoryEntry>,
}

/// Filters for a history search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSink {
    pub fn new(server_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .user_agent(concat!("shellhist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config, timeout: Duration) -> Result<Self> {
        Self::new(&config.server_url, &config.api_key, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_credential(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.header(API_KEY_HEADER, &self.api_key)
        }
    }

    /// GET /health. No credential is sent.
    pub fn health(&self) -> Result<serde_json::Value> {
        let resp = self.client.get(self.url(HEALTH_PATH)).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HistoryError::UnexpectedStatus(status.as_u16()));
        }
        Ok(resp.json()?)
    }

    /// GET /api/v1/stats/.
    pub fn stats(&self) -> Result<RemoteStats> {
        let resp = self
            .with_credential(self.client.get(self.url(STATS_PATH)))
            .send()?;
        check_status(resp.status().as_u16())?;
        Ok(resp.json()?)
    }

    /// GET /api/v1/commands/ with query filters.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<HistoryEntry>> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.text.clone()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(h) = query.hostname.as_ref().filter(|h| !h.is_empty()) {
            params.push(("hostname", h.clone()));
        }
        if let Some(u) = query.username.as_ref().filter(|u| !u.is_empty()) {
            params.push(("username", u.clone()));
        }
        let resp = self
            .with_credential(self.client.get(self.url(COMMANDS_PATH)))
            .query(&params)
            .send()?;
        check_status(resp.status().as_u16())?;
        let body: SearchResponse = resp.json()?;
        Ok(body.items)
    }
}

fn check_status(status: u16) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(HistoryError::Unauthorized(status)),
        other => Err(HistoryError::UnexpectedStatus(other)),
    }
}

impl RemoteSink for HttpSink {
    fn submit(&self, event: &CommandEvent) -> SubmitOutcome {
        let request = self
            .with_credential(self.client.post(self.url(COMMANDS_PATH)))
            .json(event);
        match request.send() {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = if resp.status().is_success() {
                    String::new()
                } else {
                    resp.text().unwrap_or_default()
                };
                let outcome = classify_status(status, &body);
                debug!("Submit to {} returned HTTP {} ({}).", self.base_url, status, outcome.label());
                outcome
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    e.to_string()
                };
                warn!("Submit to {} failed: {}", self.base_url, reason);
                SubmitOutcome::Transient(reason)
            }
        }
    }
}
