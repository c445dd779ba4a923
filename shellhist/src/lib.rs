// shellhist/src/lib.rs
//! # shellhist CLI
//!
//! This crate provides the `shellhist` binary: the shell-hook entry point
//! (`capture`), the outbox drain (`flush`), and the operator commands for
//! rules, configuration and querying the history service. The logic lives in
//! `shellhist-core`; this crate parses arguments, sets up logging and prints.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

pub use commands::AppContext;
