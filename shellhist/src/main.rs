// shellhist/src/main.rs
//! shellhist entry point.
//!
//! Parses arguments, initializes logging and dispatches to the subcommand.
//! `capture` and `flush` exit 0 no matter what happens, since they run from
//! shell hooks and cron-like contexts where a failure status is only noise.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use log::{debug, LevelFilter};
use std::ffi::OsString;
use std::io;
use std::process::ExitCode;

use shellhist::cli::{Cli, Commands};
use shellhist::commands::{self, AppContext};
use shellhist::logger::{self, LogTarget};
use shellhist_core::{ConfigOverrides, Paths};

fn main() -> ExitCode {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            let informational = matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            if !informational && is_hook_invocation(&argv) {
                return ExitCode::SUCCESS;
            }
            e.exit();
        }
    };

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    let hook = matches!(cli.command, Commands::Capture(_));
    let exits_zero = matches!(cli.command, Commands::Capture(_) | Commands::Flush);

    let paths = match Paths::resolve() {
        Ok(paths) => paths,
        Err(e) => {
            if hook {
                return ExitCode::SUCCESS;
            }
            logger::init_logger(level, LogTarget::Stderr);
            eprintln!("Error: {}", e);
            return if exits_zero { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
    };

    let target = if hook {
        LogTarget::File(paths.diagnostic_log())
    } else {
        LogTarget::Stderr
    };
    logger::init_logger(level, target);
    debug!("Resolved paths: {:?}", paths);

    let overrides = ConfigOverrides {
        server_url: cli.server.clone().filter(|s| !s.trim().is_empty()),
        api_key: None,
    };
    let ctx = AppContext::new(paths, overrides);

    match dispatch(&ctx, &cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if exits_zero {
                debug!("Ignoring failure in hook command: {:#}", e);
                return ExitCode::SUCCESS;
            }
            ctx.error_msg(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(ctx: &AppContext, command: &Commands) -> Result<()> {
    let mut out = io::stdout().lock();
    match command {
        Commands::Capture(args) => {
            commands::capture::run_capture(ctx, args);
            Ok(())
        }
        Commands::Flush => commands::flush::run_flush(ctx, &mut out),
        Commands::Rules(sub) => commands::rules::run_rules(ctx, sub, &mut out),
        Commands::Config(sub) => commands::config::run_config(ctx, sub, &mut out),
        Commands::Test => commands::remote::run_test(ctx, &mut out),
        Commands::Stats => commands::remote::run_stats(ctx, &mut out),
        Commands::Status { json } => commands::status::run_status(ctx, *json, &mut out),
        Commands::Search(args) => commands::remote::run_search(ctx, args, &mut out),
    }
}

/// True when the subcommand is `capture` or `flush`, the two commands hooks call.
fn is_hook_invocation(argv: &[OsString]) -> bool {
    let mut args = argv.iter().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--server" {
            args.next();
            continue;
        }
        if arg.to_string_lossy().starts_with('-') {
            continue;
        }
        return arg == "capture" || arg == "flush";
    }
    false
}
