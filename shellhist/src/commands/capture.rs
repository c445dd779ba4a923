//! `shellhist capture`: the prompt-hook entry point.
//!
//! Nothing here returns an error or prints. The logger is pointed at the
//! diagnostic log before this runs.

use log::{debug, info, warn};

use shellhist_core::{
    should_flush, CaptureCoordinator, CaptureReport, CaptureRequest, HttpSink, FLUSH_TIMEOUT,
};

use crate::cli::CaptureCommand;
use crate::commands::flush::flush_pass;
use crate::commands::AppContext;

pub fn run_capture(ctx: &AppContext, args: &CaptureCommand) -> CaptureReport {
    if args.command.trim().is_empty() {
        debug!("Blank command line, nothing to capture.");
        return CaptureReport::Dropped("blank command".to_string());
    }

    let coordinator = CaptureCoordinator::new(ctx.paths.clone(), ctx.overrides.clone());
    let request = CaptureRequest {
        command: args.command.clone(),
        exit_code: args.exit_code,
        cwd: args.cwd.clone(),
    };
    let (report, config) = coordinator.capture(&request);

    match &report {
        CaptureReport::Delivered { redacted } => debug!("Captured and delivered (redacted: {}).", redacted),
        CaptureReport::Buffered { outcome, queued } => {
            info!("Captured into outbox ({}); {} event(s) waiting.", outcome.label(), queued)
        }
        CaptureReport::Dropped(reason) => warn!("Capture dropped: {}", reason),
    }

    let Some(config) = config else {
        return report;
    };
    if should_flush(config.flush_probability) {
        match ctx.outbox().is_empty() {
            Ok(false) => match HttpSink::from_config(&config, FLUSH_TIMEOUT) {
                Ok(sink) => {
                    debug!("Running opportunistic flush after capture.");
                    match flush_pass(ctx, &sink) {
                        Ok(summary) if summary.already_running => {
                            debug!("Opportunistic flush skipped, another flush is running.")
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Opportunistic flush failed: {:#}", e),
                    }
                }
                Err(e) => warn!("Could not build HTTP client for flush: {}", e),
            },
            Ok(true) => {}
            Err(e) => warn!("Could not read outbox: {}", e),
        }
    }
    report
}
