//! Commands that query the history service: `test`, `stats` and `search`.

use anyhow::{bail, Context, Result};
use log::debug;
use std::io::Write;

use shellhist_core::{HistoryEntry, HistoryError, HttpSink, SearchQuery, FLUSH_TIMEOUT};

use crate::cli::SearchCommand;
use crate::commands::AppContext;
use crate::ui::output_format;
use crate::ui::theme::ThemeEntry;

fn sink_for(ctx: &AppContext) -> Result<(HttpSink, bool)> {
    let config = ctx.load_config()?;
    let has_key = !config.api_key.is_empty();
    let sink = HttpSink::from_config(&config, FLUSH_TIMEOUT).context("Cannot create HTTP client")?;
    Ok((sink, has_key))
}

/// `shellhist test`
pub fn run_test<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    ctx.report_alert();
    let (sink, has_key) = sink_for(ctx)?;
    let color = ctx.stdout_color();

    let health = match sink.health() {
        Ok(health) => health,
        Err(e) => {
            output_format::print_error_message(
                out,
                &format!("Cannot connect to {}", sink.base_url()),
                &ctx.theme,
                color,
            )?;
            writeln!(out, "  Error: {}", e)?;
            bail!("connection test failed");
        }
    };
    output_format::print_success_message(out, &format!("Connected to {}", sink.base_url()), &ctx.theme, color)?;
    if let Some(status) = health.get("status") {
        let status = status.as_str().map(str::to_string).unwrap_or_else(|| status.to_string());
        writeln!(out, "  Status: {}", status)?;
    }

    if !has_key {
        writeln!(out, "  API key: (not set)")?;
        return Ok(());
    }
    match sink.stats() {
        Ok(_) => {
            ctx.alert().clear();
            output_format::print_success_message(out, "API key accepted", &ctx.theme, color)?;
            Ok(())
        }
        Err(HistoryError::Unauthorized(status)) => {
            ctx.alert().raise();
            output_format::print_error_message(
                out,
                &format!("API key rejected (HTTP {})", status),
                &ctx.theme,
                color,
            )?;
            bail!("the history service refused the configured API key");
        }
        Err(e) => {
            debug!("Credential check failed: {}", e);
            ctx.warn_msg(format!("Could not verify API key: {}", e));
            Ok(())
        }
    }
}

/// `shellhist stats`
pub fn run_stats<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    ctx.report_alert();
    let (sink, has_key) = sink_for(ctx)?;

    match sink.stats() {
        Ok(stats) => {
            if has_key {
                ctx.alert().clear();
            }
            if let Some(total) = stats.total_commands {
                writeln!(out, "Total commands: {}", total)?;
            }
            if let Some(hosts) = stats.active_hosts {
                writeln!(out, "Active hosts: {}", hosts)?;
            }
            if let Some(storage) = stats.storage_used {
                writeln!(out, "Storage used: {}", storage)?;
            }
            Ok(())
        }
        Err(e) => {
            if matches!(e, HistoryError::Unauthorized(_)) {
                ctx.alert().raise();
            }
            ctx.warn_msg(format!("Server statistics unavailable ({}); showing local buffer.", e));
            let outbox = ctx.outbox();
            writeln!(out, "Buffered commands: {}", outbox.len()?)?;
            writeln!(out, "Buffer path: {}", outbox.path().display())?;
            Ok(())
        }
    }
}

/// `shellhist search`
pub fn run_search<W: Write>(ctx: &AppContext, args: &SearchCommand, out: &mut W) -> Result<()> {
    let (sink, _) = sink_for(ctx)?;
    let query = SearchQuery {
        text: args.query.clone(),
        hostname: args.hostname.clone(),
        username: args.user.clone(),
        limit: args.limit,
    };

    let results = match sink.search(&query) {
        Ok(results) => results,
        Err(e) => {
            if matches!(e, HistoryError::Unauthorized(_)) {
                ctx.alert().raise();
            }
            return Err(e).context("Error searching");
        }
    };

    if results.is_empty() {
        writeln!(out, "No matching commands.")?;
        return Ok(());
    }
    let color = ctx.stdout_color();
    for entry in &results {
        writeln!(out, "{}", format_search_line(entry, ctx, color))?;
    }
    Ok(())
}

/// `[YYYY-MM-DD HH:MM:SS] host: command (exit: N)`
pub fn format_search_line(entry: &HistoryEntry, ctx: &AppContext, color: bool) -> String {
    let timestamp: String = entry
        .timestamp
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(19)
        .collect::<String>()
        .replacen('T', " ", 1);
    let exit = match entry.exit_code {
        Some(code) => format!(" (exit: {})", code),
        None => String::new(),
    };
    format!(
        "{} {}: {}{}",
        output_format::styled(&format!("[{}]", timestamp), ThemeEntry::Muted, &ctx.theme, color),
        entry.hostname.as_deref().unwrap_or("?"),
        entry.command,
        exit
    )
}
