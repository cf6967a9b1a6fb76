//! Command-line interface: argument parsing and command execution.

pub mod commands;
pub mod parser;

pub use commands::{OutputFormat, execute};
pub use parser::Cli;
