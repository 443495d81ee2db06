//! Configuration for codecritic
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > config file > defaults.

pub mod config;

pub use config::*;
