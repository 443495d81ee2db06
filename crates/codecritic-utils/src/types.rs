//! Shared identifier types used across the codecritic crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one stage of the review pipeline.
///
/// Stages always run in declaration order; `Critique` and `Translate` may be
/// skipped depending on configuration and the caller's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    /// Broad recall-oriented sweep producing candidate issues
    Draft,
    /// Adversarial peer review of the draft
    Critique,
    /// Final verification producing the authoritative result
    Review,
    /// Optional translation of the final result
    Translate,
}

impl StageId {
    /// All stages in execution order
    pub const ALL: [StageId; 4] = [
        StageId::Draft,
        StageId::Critique,
        StageId::Review,
        StageId::Translate,
    ];

    /// Stable lowercase identifier used in logs and configuration keys
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StageId::Draft => "draft",
            StageId::Critique => "critique",
            StageId::Review => "review",
            StageId::Translate => "translate",
        }
    }

    /// Human-readable label used in log messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StageId::Draft => "Draft analysis",
            StageId::Critique => "Critique analysis",
            StageId::Review => "Review analysis",
            StageId::Translate => "Translation",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value taken from an environment variable.
    Env,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl ConfigSource {
    /// Stable label for status display
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            ConfigSource::Cli => "cli",
            ConfigSource::Env => "env",
            ConfigSource::Config => "config",
            ConfigSource::Programmatic => "programmatic",
            ConfigSource::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
