//! compiler.rs - Compiles redaction rules into case-insensitive regexes.
//!
//! Compilation is lenient: a rule with an empty, oversized or invalid pattern
//! is skipped with a warning and the remaining rules still compile. A rule
//! whose name repeats an earlier rule is skipped too, so only the first
//! definition of a name is ever applied.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use crate::config::{RedactionRule, MAX_PATTERN_LENGTH};
use crate::errors::HistoryError;

/// Size cap for a single compiled regex.
const COMPILED_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Represents a single compiled redaction rule.
#[derive(Debug)]
pub struct CompiledRule {
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// Replacement template applied to every match.
    pub replacement: String,
    /// The unique name of the redaction rule.
    pub name: String,
}

/// The ordered set of rules that compiled successfully, plus the ones that didn't.
#[derive(Debug, Default)]
pub struct CompiledRules {
    /// Rules ready for application, in configured order.
    pub rules: Vec<CompiledRule>,
    /// Errors for the rules that were skipped.
    pub skipped: Vec<HistoryError>,
}

fn compile_one(rule: &RedactionRule) -> Result<Regex, HistoryError> {
    if rule.pattern.is_empty() {
        return Err(HistoryError::InvalidRule(
            rule.name.clone(),
            "pattern must not be empty".to_string(),
        ));
    }
    if rule.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(HistoryError::PatternLengthExceeded(
            rule.name.clone(),
            rule.pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }
    RegexBuilder::new(&rule.pattern)
        .case_insensitive(true)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| HistoryError::RuleCompilationError(rule.name.clone(), e))
}

/// Compiles `rules` in order. Never fails as a whole.
pub fn compile_rules(rules: &[RedactionRule]) -> CompiledRules {
    debug!("Starting compilation of {} rules.", rules.len());

    let mut compiled = CompiledRules::default();
    let mut seen_names = HashSet::new();

    for rule in rules {
        if !seen_names.insert(rule.name.as_str()) {
            warn!("Skipping rule '{}': a rule with this name was already defined.", rule.name);
            continue;
        }
        match compile_one(rule) {
            Ok(regex) => {
                debug!("Rule '{}' compiled successfully.", rule.name);
                compiled.rules.push(CompiledRule {
                    regex,
                    replacement: rule.replacement.clone(),
                    name: rule.name.clone(),
                });
            }
            Err(e) => {
                warn!("Skipping redaction rule: {}", e);
                compiled.skipped.push(e);
            }
        }
    }

    debug!(
        "Finished compiling rules. Compiled: {}, skipped: {}.",
        compiled.rules.len(),
        compiled.skipped.len()
    );
    compiled
}
