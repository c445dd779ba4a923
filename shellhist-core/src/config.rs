//! Configuration management for `shellhist-core`.
//!
//! This module defines the redaction rule record and the persisted client
//! configuration (server address, credential, ordered rule list). It resolves
//! the effective configuration with the precedence
//! runtime override > environment > config file > built-in defaults,
//! and implements the read-modify-write management operations used by the CLI.
//!
//! The config file is shared by every shell of the user, so writes go through
//! an exclusive sidecar lock and an atomic temp-file rename.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info, warn};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{HistoryError, Result};
use crate::persist::{write_atomic, FileLock};

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
/// Replacement used by `rules add` when none is given.
pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";
/// Probability that a capture also runs a flush pass.
pub const DEFAULT_FLUSH_PROBABILITY: f64 = 0.05;

/// Environment variable overriding the server address.
pub const SERVER_URL_ENV: &str = "HISTORY_CLIENT_URL";
/// Environment variable overriding the credential.
pub const API_KEY_ENV: &str = "HISTORY_API_KEY";

/// A single named pattern/replacement pair.
///
/// The replacement is a template: `$1` or `${name}` expand to capture groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct RedactionRule {
    /// Unique identifier for the rule (e.g., "aws_access_key").
    pub name: String,
    /// The regex pattern string. Always matched case-insensitively.
    pub pattern: String,
    /// The text that replaces every match.
    pub replacement: String,
}

impl RedactionRule {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Checks the rule the way `rules add` requires: non-empty name and
    /// pattern, bounded length, and a pattern that compiles.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HistoryError::InvalidRule(
                self.name.clone(),
                "name must not be empty".to_string(),
            ));
        }
        if self.pattern.is_empty() {
            return Err(HistoryError::InvalidRule(
                self.name.clone(),
                "pattern must not be empty".to_string(),
            ));
        }
        if self.pattern.len() > MAX_PATTERN_LENGTH {
            return Err(HistoryError::PatternLengthExceeded(
                self.name.clone(),
                self.pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
        }
        RegexBuilder::new(&self.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| HistoryError::RuleCompilationError(self.name.clone(), e))?;
        Ok(())
    }
}

/// The on-disk shape of the config file. Only file values live here;
/// environment and runtime overrides are never written back.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redaction_rules: Vec<RedactionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_probability: Option<f64>,
}

/// Values supplied at runtime, highest precedence.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
}

/// The effective configuration handed to the other components.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server_url: String,
    /// Empty when no credential is configured.
    pub api_key: String,
    pub redaction_rules: Vec<RedactionRule>,
    pub flush_probability: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: String::new(),
            redaction_rules: Vec::new(),
            flush_probability: DEFAULT_FLUSH_PROBABILITY,
        }
    }
}

impl Config {
    /// The credential masked for display: first 8 and last 4 characters.
    pub fn masked_api_key(&self) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 12 {
            return Some("****".to_string());
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        Some(format!("{}...{}", head, tail))
    }
}

/// Loads and persists the config file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw file. A missing file is an empty config; an unreadable or
    /// unparseable one is an error.
    pub fn read_file(&self) -> Result<ConfigFile> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults.", self.path.display());
                return Ok(ConfigFile::default());
            }
            Err(e) => return Err(HistoryError::ConfigRead(self.path.clone(), e)),
        };
        if text.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_json::from_str(&text).map_err(|e| HistoryError::ConfigParse(self.path.clone(), e))
    }

    /// Resolves the effective configuration using the process environment.
    pub fn load(&self, overrides: &ConfigOverrides) -> Result<Config> {
        self.load_with_env(overrides, &EnvValues::from_process())
    }

    /// Resolves the effective configuration from explicit environment values.
    pub fn load_with_env(&self, overrides: &ConfigOverrides, env: &EnvValues) -> Result<Config> {
        let file = self.read_file()?;
        let mut config = Config::default();

        if !file.server_url.is_empty() {
            config.server_url = file.server_url;
        }
        if !file.api_key.is_empty() {
            config.api_key = file.api_key;
        }
        if let Some(p) = file.flush_probability {
            if (0.0..=1.0).contains(&p) {
                config.flush_probability = p;
            } else {
                warn!("Ignoring out-of-range flush_probability {} in config.", p);
            }
        }
        config.redaction_rules = file.redaction_rules;

        if let Some(url) = non_empty(env.server_url.as_deref()) {
            config.server_url = url;
        }
        if let Some(key) = non_empty(env.api_key.as_deref()) {
            config.api_key = key;
        }
        if let Some(url) = non_empty(overrides.server_url.as_deref()) {
            config.server_url = url;
        }
        if let Some(key) = non_empty(overrides.api_key.as_deref()) {
            config.api_key = key;
        }

        config.server_url = config.server_url.trim_end_matches('/').to_string();
        warn_on_duplicate_names(&config.redaction_rules);
        Ok(config)
    }

    /// Locked read-modify-write of the config file.
    pub fn update<T>(&self, f: impl FnOnce(&mut ConfigFile) -> Result<T>) -> Result<T> {
        let _lock = FileLock::exclusive(&self.path)?;
        let mut file = self.read_file()?;
        let out = f(&mut file)?;
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, &json)?;
        restrict_permissions(&self.path);
        Ok(out)
    }

    /// Appends a rule, rejecting a name that is already taken.
    pub fn add_rule(&self, rule: RedactionRule) -> Result<()> {
        rule.validate()?;
        self.update(|file| {
            if file.redaction_rules.iter().any(|r| r.name == rule.name) {
                return Err(HistoryError::DuplicateRule(rule.name.clone()));
            }
            info!("Adding redaction rule '{}'.", rule.name);
            file.redaction_rules.push(rule);
            Ok(())
        })
    }

    /// Removes every rule with the given name and returns how many were removed.
    pub fn remove_rule(&self, name: &str) -> Result<usize> {
        self.update(|file| {
            let before = file.redaction_rules.len();
            file.redaction_rules.retain(|r| r.name != name);
            let removed = before - file.redaction_rules.len();
            if removed == 0 {
                return Err(HistoryError::UnknownRule(name.to_string()));
            }
            info!("Removed {} rule(s) named '{}'.", removed, name);
            Ok(removed)
        })
    }

    /// Rules in configured order, exactly as persisted.
    pub fn list_rules(&self) -> Result<Vec<RedactionRule>> {
        Ok(self.read_file()?.redaction_rules)
    }

    pub fn set_server(&self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        self.update(|file| {
            file.server_url = url;
            Ok(())
        })
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        let key = key.trim().to_string();
        self.update(|file| {
            file.api_key = key;
            Ok(())
        })
    }
}

/// Environment-sourced values, separated out so tests don't mutate the process env.
#[derive(Debug, Default, Clone)]
pub struct EnvValues {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
}

impl EnvValues {
    pub fn from_process() -> Self {
        Self {
            server_url: std::env::var(SERVER_URL_ENV).ok(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn warn_on_duplicate_names(rules: &[RedactionRule]) {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.name.as_str()) {
            warn!(
                "Duplicate rule name '{}' in config; only the first definition is applied.",
                rule.name
            );
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!("Could not restrict permissions on {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ConfigStore {
        ConfigStore::new(dir.join("config.json"))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = store_in(dir.path())
            .load_with_env(&ConfigOverrides::default(), &EnvValues::default())
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn precedence_is_override_then_env_then_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.set_server("http://file:1").unwrap();
        store.set_api_key("file-key").unwrap();

        let none = ConfigOverrides::default();
        let no_env = EnvValues::default();
        let config = store.load_with_env(&none, &no_env).unwrap();
        assert_eq!(config.server_url, "http://file:1");
        assert_eq!(config.api_key, "file-key");

        let env = EnvValues {
            server_url: Some("http://env:2".into()),
            api_key: Some("env-key".into()),
        };
        let config = store.load_with_env(&none, &env).unwrap();
        assert_eq!(config.server_url, "http://env:2");
        assert_eq!(config.api_key, "env-key");

        let overrides = ConfigOverrides {
            server_url: Some("http://flag:3/".into()),
            api_key: None,
        };
        let config = store.load_with_env(&overrides, &env).unwrap();
        assert_eq!(config.server_url, "http://flag:3");
        assert_eq!(config.api_key, "env-key");
    }

    #[test]
    fn persisted_file_never_contains_env_values() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.set_server("http://file:1").unwrap();
        let env = EnvValues {
            server_url: None,
            api_key: Some("env-only".into()),
        };
        let _ = store.load_with_env(&ConfigOverrides::default(), &env).unwrap();
        store
            .add_rule(RedactionRule::new("aws", "AKIA[0-9A-Z]{16}", "[AWS_KEY]"))
            .unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("env-only"));
        assert!(raw.contains("redaction_rules"));
    }

    #[test]
    fn add_rule_rejects_duplicates_and_keeps_order() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.add_rule(RedactionRule::new("a", "secret", "[R]")).unwrap();
        store.add_rule(RedactionRule::new("b", "token", "[T]")).unwrap();
        let err = store
            .add_rule(RedactionRule::new("a", "other", "[X]"))
            .unwrap_err();
        assert!(matches!(err, HistoryError::DuplicateRule(ref n) if n == "a"));

        let names: Vec<_> = store.list_rules().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn add_rule_rejects_invalid_patterns() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.add_rule(RedactionRule::new("bad", "[invalid(regex", "[R]")),
            Err(HistoryError::RuleCompilationError(..))
        ));
        assert!(matches!(
            store.add_rule(RedactionRule::new("long", "a".repeat(MAX_PATTERN_LENGTH + 1), "[R]")),
            Err(HistoryError::PatternLengthExceeded(..))
        ));
        assert!(matches!(
            store.add_rule(RedactionRule::new("", "x", "[R]")),
            Err(HistoryError::InvalidRule(..))
        ));
        assert!(store.list_rules().unwrap().is_empty());
    }

    #[test]
    fn remove_rule_removes_all_copies_or_errors() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let dup = ConfigFile {
            redaction_rules: vec![
                RedactionRule::new("a", "x", "[1]"),
                RedactionRule::new("a", "y", "[2]"),
                RedactionRule::new("b", "z", "[3]"),
            ],
            ..Default::default()
        };
        fs::write(store.path(), serde_json::to_string(&dup).unwrap()).unwrap();

        assert_eq!(store.remove_rule("a").unwrap(), 2);
        assert!(matches!(store.remove_rule("a"), Err(HistoryError::UnknownRule(_))));
        assert_eq!(store.list_rules().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(
            store.load_with_env(&ConfigOverrides::default(), &EnvValues::default()),
            Err(HistoryError::ConfigParse(..))
        ));
    }

    #[test]
    fn out_of_range_flush_probability_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), r#"{"flush_probability": 7.5}"#).unwrap();
        let config = store
            .load_with_env(&ConfigOverrides::default(), &EnvValues::default())
            .unwrap();
        assert_eq!(config.flush_probability, DEFAULT_FLUSH_PROBABILITY);
    }

    #[test]
    fn masked_api_key() {
        let mut config = Config::default();
        assert_eq!(config.masked_api_key(), None);
        config.api_key = "short".into();
        assert_eq!(config.masked_api_key().as_deref(), Some("****"));
        config.api_key = "abcdefgh-1234-5678-wxyz".into();
        assert_eq!(config.masked_api_key().as_deref(), Some("abcdefgh...wxyz"));
    }
}
