//! `shellhist status`: local state only, never touches the network.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use shellhist_core::SessionIdentity;

use crate::commands::AppContext;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub buffered: usize,
    pub oldest_buffered: Option<String>,
    pub buffer_path: String,
    pub session_id: Option<String>,
    pub credential_alert: Option<String>,
    pub server_url: String,
}

pub fn collect_status(ctx: &AppContext) -> Result<StatusReport> {
    let outbox = ctx.outbox();
    let events = outbox.list()?;
    let oldest_buffered = events.iter().filter_map(|e| e.timestamp.clone()).min();
    // A broken config shouldn't hide the local buffer state.
    let server_url = match ctx.load_config() {
        Ok(config) => config.server_url,
        Err(e) => format!("(unavailable: {:#})", e),
    };
    Ok(StatusReport {
        buffered: events.len(),
        oldest_buffered,
        buffer_path: outbox.path().display().to_string(),
        session_id: SessionIdentity::new(ctx.paths.session_file()).current(),
        credential_alert: ctx.alert().raised_at(),
        server_url,
    })
}

pub fn run_status<W: Write>(ctx: &AppContext, json: bool, out: &mut W) -> Result<()> {
    let report = collect_status(ctx)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(out, "Server URL: {}", report.server_url)?;
    writeln!(out, "Buffered commands: {}", report.buffered)?;
    if let Some(oldest) = &report.oldest_buffered {
        match age_of(oldest, Utc::now()) {
            Some(age) => writeln!(out, "Oldest buffered: {} ({} ago)", oldest, age)?,
            None => writeln!(out, "Oldest buffered: {}", oldest)?,
        }
    }
    writeln!(out, "Buffer path: {}", report.buffer_path)?;
    writeln!(
        out,
        "Session: {}",
        report.session_id.as_deref().unwrap_or("(not created yet)")
    )?;
    ctx.report_alert();
    Ok(())
}

/// Coarse human-readable age of an RFC 3339 timestamp.
fn age_of(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let then = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    let secs = (now - then).num_seconds().max(0);
    Some(match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    })
}
