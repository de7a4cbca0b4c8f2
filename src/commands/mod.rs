//! CLI command implementations for container-state-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration, socket and runtime connectivity validation
//! - `config`: Configuration file generation
//! - `test`: Collection testing against the live runtime

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
