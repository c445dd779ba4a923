// shellhist/src/cli.rs
//! Command-line interface definition for `shellhist`: every subcommand the
//! shell hooks and the operator can invoke, and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand};

use shellhist_core::config::{DEFAULT_REPLACEMENT, SERVER_URL_ENV};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "shellhist",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Capture shell commands and ship them to a central history service",
    long_about = "shellhist runs from your shell's prompt hook. Each command is redacted with your configured rules, sent to the history service, and buffered locally when the service can't be reached. Buffered commands are retried by `shellhist flush`.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Suppress all informational and debug messages.
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// History service URL for this invocation only.
    #[arg(long, global = true, value_name = "URL", env = SERVER_URL_ENV)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record one shell command. Intended for shell hooks; always exits 0.
    Capture(CaptureCommand),

    /// Retry delivery of every buffered command. Always exits 0.
    Flush,

    /// Manage redaction rules applied before commands leave this machine.
    #[command(subcommand, visible_alias = "redaction")]
    Rules(RulesCommand),

    /// Show or change the client configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Check connectivity and credentials against the history service.
    Test,

    /// Show usage statistics from the service, or local buffer stats when offline.
    Stats,

    /// Show local state: buffer size, session id and pending alerts.
    Status {
        /// Print machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Search command history stored on the service.
    Search(SearchCommand),
}

#[derive(Args, Debug)]
pub struct CaptureCommand {
    /// The command line exactly as typed.
    #[arg(allow_hyphen_values = true)]
    pub command: String,

    /// Exit status of the command.
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    pub exit_code: Option<i32>,

    /// Working directory the command ran in. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List configured rules in application order.
    List,

    /// Append a new rule.
    Add {
        /// Unique rule name.
        #[arg(long)]
        name: String,

        /// Regex pattern, matched case-insensitively.
        #[arg(long, allow_hyphen_values = true)]
        pattern: String,

        /// Replacement text; `$1` or `${name}` expand to capture groups.
        #[arg(long, default_value = DEFAULT_REPLACEMENT, allow_hyphen_values = true)]
        replacement: String,
    },

    /// Remove every rule with the given name.
    Remove {
        name: String,
    },

    /// Show what the configured rules do to a piece of text. Nothing is sent.
    Test {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration with the API key masked.
    Show,

    /// Persist the API key.
    SetApiKey {
        key: String,
    },

    /// Persist the server URL.
    SetServer {
        url: String,
    },
}

#[derive(Args, Debug)]
pub struct SearchCommand {
    pub query: String,

    /// Filter by hostname.
    #[arg(long)]
    pub hostname: Option<String>,

    /// Filter by username.
    #[arg(long)]
    pub user: Option<String>,

    /// Maximum number of results.
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}
