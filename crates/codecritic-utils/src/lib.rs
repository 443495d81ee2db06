//! Foundation utilities shared by the codecritic crates
//!
//! - [`error`]: error taxonomy with user-facing rendering and exit code mapping
//! - [`exit_codes`]: the CLI exit code contract
//! - [`logging`]: tracing setup and stage log helpers
//! - [`redaction`]: secret scrubbing for error text
//! - [`types`]: stage and configuration-source identifiers

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

pub use error::{
    ConfigError, CriticError, ErrorCategory, LlmError, PipelineError, SourceError, StageError,
    UserFriendlyError,
};
pub use exit_codes::ExitCode;
pub use types::{ConfigSource, StageId};
