//! calcli command-line interface
//!
//! This crate provides the `calcli` binary: argument parsing, configuration
//! and the command handlers built on `calcli-core` and `calcli-store`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
