//! Subcommand implementations and the context they share.

pub mod capture;
pub mod config;
pub mod flush;
pub mod remote;
pub mod rules;
pub mod status;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::io;

use shellhist_core::{
    Config, ConfigOverrides, ConfigStore, CredentialAlert, DurableOutbox, Paths,
};

use crate::ui::output_format;
use crate::ui::theme::{ThemeMap, ThemeStyle};

/// Everything a subcommand needs to find its files and print.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub paths: Paths,
    pub overrides: ConfigOverrides,
    pub theme: ThemeMap,
}

impl AppContext {
    pub fn new(paths: Paths, overrides: ConfigOverrides) -> Self {
        Self {
            paths,
            overrides,
            theme: ThemeStyle::default_theme_map(),
        }
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(&self.paths.config_file)
    }

    pub fn load_config(&self) -> Result<Config> {
        self.config_store()
            .load(&self.overrides)
            .with_context(|| format!("Failed to load configuration from {}", self.paths.config_file.display()))
    }

    pub fn outbox(&self) -> DurableOutbox {
        DurableOutbox::new(self.paths.outbox_file())
    }

    pub fn alert(&self) -> CredentialAlert {
        CredentialAlert::new(self.paths.auth_alert_file())
    }

    pub fn stdout_color(&self) -> bool {
        io::stdout().is_terminal()
    }

    pub fn warn_msg(&self, msg: impl AsRef<str>) {
        let color = io::stderr().is_terminal();
        let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), &self.theme, color);
    }

    pub fn error_msg(&self, msg: impl AsRef<str>) {
        let color = io::stderr().is_terminal();
        let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), &self.theme, color);
    }

    /// Prints the pending credential alert, if any. Returns whether one was pending.
    pub fn report_alert(&self) -> bool {
        match self.alert().raised_at() {
            Some(at) => {
                self.warn_msg(format!(
                    "The history service rejected the configured API key (at {}). \
                     Buffered commands are kept; fix it with `shellhist config set-api-key`.",
                    at
                ));
                true
            }
            None => false,
        }
    }
}
