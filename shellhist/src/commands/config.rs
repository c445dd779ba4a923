//! `shellhist config`: inspect and change the persisted configuration.

use anyhow::{bail, Context, Result};
use std::io::Write;

use crate::cli::ConfigCommand;
use crate::commands::AppContext;
use crate::ui::output_format;

pub fn run_config<W: Write>(ctx: &AppContext, command: &ConfigCommand, out: &mut W) -> Result<()> {
    match command {
        ConfigCommand::Show => show(ctx, out),
        ConfigCommand::SetApiKey { key } => {
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            ctx.config_store()
                .set_api_key(key)
                .context("Error saving configuration")?;
            output_format::print_success_message(out, "API key saved successfully", &ctx.theme, ctx.stdout_color())?;
            Ok(())
        }
        ConfigCommand::SetServer { url } => {
            let trimmed = url.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                bail!("Server URL must start with http:// or https://, got '{}'", url);
            }
            ctx.config_store()
                .set_server(trimmed)
                .context("Error saving configuration")?;
            output_format::print_success_message(
                out,
                &format!("Server URL set to: {}", trimmed.trim_end_matches('/')),
                &ctx.theme,
                ctx.stdout_color(),
            )?;
            Ok(())
        }
    }
}

fn show<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    let config = ctx.load_config()?;
    writeln!(out, "Server URL: {}", config.server_url)?;
    match config.masked_api_key() {
        Some(masked) => writeln!(out, "API Key: {}", masked)?,
        None => writeln!(out, "API Key: (not set)")?,
    }
    writeln!(out, "Redaction rules: {}", config.redaction_rules.len())?;
    writeln!(out, "Flush probability: {}", config.flush_probability)?;
    writeln!(out, "Config file: {}", ctx.paths.config_file.display())?;
    writeln!(out, "Buffer path: {}", ctx.paths.outbox_file().display())?;
    Ok(())
}
