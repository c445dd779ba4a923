// shellhist-core/src/engine.rs
//! The redaction pipeline applied to every command before it leaves the machine.
//!
//! Rules are applied strictly in configured order and each rule sees the
//! fully-substituted output of the previous one. Rules therefore compound: a
//! later rule can match text that an earlier rule's replacement introduced.
//! That is intended; operators order their rules accordingly.
//!
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::config::RedactionRule;
use crate::sanitizers::compiler::{compile_rules, CompiledRules};

/// Result of running the pipeline over one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionOutcome {
    /// The text after every rule has been applied.
    pub text: String,
    /// True iff at least one rule matched at least once.
    pub redacted: bool,
    /// Names of the rules that matched, in application order.
    pub matched_rules: Vec<String>,
}

/// Ordered, compiled rule set. Construction never fails; bad rules are skipped.
#[derive(Debug)]
pub struct RuleEngine {
    compiled: CompiledRules,
}

impl RuleEngine {
    pub fn new(rules: &[RedactionRule]) -> Self {
        Self {
            compiled: compile_rules(rules),
        }
    }

    /// Number of rules that compiled and will be applied.
    pub fn active_rules(&self) -> usize {
        self.compiled.rules.len()
    }

    /// Number of rules skipped at construction.
    pub fn skipped_rules(&self) -> usize {
        self.compiled.skipped.len()
    }

    /// Applies every active rule in order, replacing all non-overlapping matches per rule.
    pub fn redact(&self, text: &str) -> RedactionOutcome {
        let mut current = text.to_string();
        let mut matched_rules = Vec::new();

        for rule in &self.compiled.rules {
            if !rule.regex.is_match(&current) {
                continue;
            }
            current = rule
                .regex
                .replace_all(&current, rule.replacement.as_str())
                .into_owned();
            matched_rules.push(rule.name.clone());
        }

        if !matched_rules.is_empty() {
            debug!("Redaction applied by rules: {:?}", matched_rules);
        }

        RedactionOutcome {
            text: current,
            redacted: !matched_rules.is_empty(),
            matched_rules,
        }
    }
}
