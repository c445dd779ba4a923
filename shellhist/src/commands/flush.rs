//! `shellhist flush`: retry everything in the outbox once.

use anyhow::Result;
use log::warn;
use std::io::Write;

use shellhist_core::{FlushCoordinator, FlushSummary, HttpSink, RemoteSink, FLUSH_TIMEOUT};

use crate::commands::AppContext;
use crate::ui::output_format;

/// One pass against `sink`, shared by the `flush` command and capture.
pub fn flush_pass<S: RemoteSink>(ctx: &AppContext, sink: &S) -> Result<FlushSummary> {
    let outbox = ctx.outbox();
    let alert = ctx.alert();
    Ok(FlushCoordinator::new(&outbox, &alert).flush(sink)?)
}

/// Runs the command. Problems are reported but never turn into a failing exit status.
pub fn run_flush<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    let config = match ctx.load_config() {
        Ok(config) => config,
        Err(e) => {
            ctx.error_msg(format!("{:#}", e));
            return Ok(());
        }
    };

    let outbox = ctx.outbox();
    match outbox.is_empty() {
        Ok(true) => {
            output_format::print_info_message(out, "Buffer is empty", &ctx.theme, ctx.stdout_color())?;
            ctx.report_alert();
            return Ok(());
        }
        Ok(false) => {}
        Err(e) => {
            ctx.error_msg(format!("Cannot read buffer {}: {}", outbox.path().display(), e));
            return Ok(());
        }
    }

    let sink = match HttpSink::from_config(&config, FLUSH_TIMEOUT) {
        Ok(sink) => sink,
        Err(e) => {
            ctx.error_msg(format!("Cannot create HTTP client: {}", e));
            return Ok(());
        }
    };

    let summary = match flush_pass(ctx, &sink) {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Flush failed: {:#}", e);
            ctx.error_msg(format!("Flush failed: {:#}", e));
            return Ok(());
        }
    };
    if summary.already_running {
        output_format::print_info_message(
            out,
            &format!("Another flush is already running; {} commands buffered", summary.remaining),
            &ctx.theme,
            ctx.stdout_color(),
        )?;
        return Ok(());
    }
    print_summary(ctx, &summary, out)?;
    if summary.unauthorized || summary.sent == 0 {
        ctx.report_alert();
    }
    Ok(())
}

fn print_summary<W: Write>(ctx: &AppContext, summary: &FlushSummary, out: &mut W) -> Result<()> {
    let color = ctx.stdout_color();
    output_format::print_success_message(
        out,
        &format!("Sent {} buffered commands", summary.sent),
        &ctx.theme,
        color,
    )?;
    if summary.dropped > 0 {
        writeln!(out, "{} commands dropped after being rejected twice", summary.dropped)?;
    }
    if summary.remaining > 0 {
        writeln!(out, "{} commands still buffered", summary.remaining)?;
    }
    if summary.unauthorized {
        writeln!(out, "Stopped early: the service refused the API key")?;
    }
    Ok(())
}
