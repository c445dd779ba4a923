//! Rule compilation for the redaction pipeline.
//!
//! `compiler` turns configured `RedactionRule`s into regexes; the
//! `RuleEngine` in `crate::engine` applies them in order.

pub mod compiler;
