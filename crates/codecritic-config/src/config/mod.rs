//! Configuration management for codecritic
//!
//! This module provides hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. Supports TOML configuration files with
//! `[defaults]`, `[llm]`, and `[stages]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

use std::time::Duration;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use codecritic_utils::types::ConfigSource;
pub use model::*;

use codecritic_utils::types::StageId;

impl Config {
    /// Model used by stages without their own override.
    ///
    /// Precedence: `[defaults].model` (after CLI/env overrides) > `gpt-4o-mini`.
    #[must_use]
    pub fn default_model(&self) -> String {
        self.defaults
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Get the model to use for a specific stage.
    ///
    /// Precedence (highest to lowest):
    /// 1. Stage-specific override (`[stages.<stage>].model`)
    /// 2. Global default (`[defaults].model`)
    /// 3. Hard default: `"gpt-4o-mini"`
    #[must_use]
    pub fn model_for_stage(&self, stage: StageId) -> String {
        self.stages
            .get(stage)
            .and_then(|sc| sc.model.clone())
            .unwrap_or_else(|| self.default_model())
    }

    /// Temperature override for a stage, if one is configured.
    ///
    /// `None` means the stage's built-in temperature applies.
    #[must_use]
    pub fn temperature_for_stage(&self, stage: StageId) -> Option<f64> {
        self.stages.get(stage).and_then(|sc| sc.temperature)
    }

    /// Timeout for one stage: stage override > `[defaults].stage_timeout` > 600 s.
    #[must_use]
    pub fn timeout_for_stage(&self, stage: StageId) -> Duration {
        let secs = self
            .stages
            .get(stage)
            .and_then(|sc| sc.timeout)
            .or(self.defaults.stage_timeout)
            .unwrap_or(DEFAULT_STAGE_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Whether the critique stage runs. Defaults to `true`.
    #[must_use]
    pub fn critique_enabled(&self) -> bool {
        self.stages.critique_enabled.unwrap_or(true)
    }

    /// Target language for the translation stage, if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.defaults.language.as_deref()
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// Configured provider id; `openai` when unset.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Name of the environment variable holding the API key.
    #[must_use]
    pub fn api_key_env(&self) -> &str {
        self.llm
            .openai
            .as_ref()
            .and_then(|o| o.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Transport retry budget for the HTTP backend. Defaults to 0.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.llm
            .openai
            .as_ref()
            .and_then(|o| o.max_retries)
            .unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Create a minimal Config for testing purposes
    pub fn minimal_for_testing() -> Self {
        Config {
            defaults: Defaults::default(),
            llm: LlmConfig::default(),
            stages: StagesConfig::default(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}
