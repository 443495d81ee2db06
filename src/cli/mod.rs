//! Command-line interface for codecritic
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and output rendering

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, OutputFormat, build_cli};
pub use run::run;
