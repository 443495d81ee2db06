use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use codecritic_utils::types::{ConfigSource, StageId};

/// Model used when neither the CLI, the environment nor a config file names one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default per-stage timeout in seconds
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 600;

/// Default generation provider
pub const DEFAULT_PROVIDER: &str = "openai";

/// Environment variable holding the API key unless `api_key_env` says otherwise
pub const DEFAULT_API_KEY_ENV: &str = "ANALYZER_API_KEY";

/// Environment variable consulted for the service base URL
pub const BASE_URL_ENV: &str = "ANALYZER_BASE_URL";

/// Environment variable overriding the default model
pub const MODEL_ENV: &str = "CODECRITIC_MODEL";

/// Base URL used when no other source provides one
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Providers the backend factory knows how to construct
pub const KNOWN_PROVIDERS: &[&str] = &["openai"];

/// Configuration for codecritic runs.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > environment > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that:
/// - Searches for `.codecritic/config.toml` upward from current directory
/// - Applies `CODECRITIC_MODEL` and `ANALYZER_BASE_URL` from the environment
/// - Applies built-in defaults for unspecified values
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `env`, `config`,
/// `programmatic`, or `default`) for `codecritic config`.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// model = "gpt-4o-mini"
/// stage_timeout = 600
/// language = "German"
///
/// [llm]
/// provider = "openai"
///
/// [llm.openai]
/// api_key_env = "ANALYZER_API_KEY"
/// base_url = "https://api.openai.com/v1"
/// max_retries = 0
///
/// [stages]
/// critique_enabled = true
///
/// [stages.review]
/// model = "gpt-4o"
/// temperature = 0.1
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Default values for run-wide settings.
    pub defaults: Defaults,
    /// Generation provider configuration.
    pub llm: LlmConfig,
    /// Stage toggles and per-stage overrides.
    pub stages: StagesConfig,
    /// Source attribution for each setting (for status display).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Default configuration values
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Model used by every stage without its own override.
    pub model: Option<String>,
    /// Per-stage timeout in seconds.
    pub stage_timeout: Option<u64>,
    pub verbose: Option<bool>,
    /// Target language; when set the final review is translated.
    pub language: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: None,
            stage_timeout: Some(DEFAULT_STAGE_TIMEOUT_SECS),
            verbose: Some(false),
            language: None,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub openai: Option<OpenAiConfig>,
}

/// OpenAI-compatible HTTP provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    /// Transport-level retries for 5xx and network failures. Default 0.
    pub max_retries: Option<u32>,
}

/// Per-stage configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StageConfig {
    /// Model for this stage (overrides defaults.model)
    pub model: Option<String>,
    /// Sampling temperature for this stage (overrides the stage's built-in value)
    pub temperature: Option<f64>,
    /// Timeout in seconds (overrides defaults.stage_timeout)
    pub timeout: Option<u64>,
}

/// `[stages]` section
///
/// ```toml
/// [stages]
/// critique_enabled = false
///
/// [stages.draft]
/// model = "gpt-4o"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StagesConfig {
    /// Whether the adversarial critique stage runs. Default: true.
    pub critique_enabled: Option<bool>,
    pub draft: Option<StageConfig>,
    pub critique: Option<StageConfig>,
    pub review: Option<StageConfig>,
    pub translate: Option<StageConfig>,
}

impl StagesConfig {
    /// Override block for one stage, if configured
    #[must_use]
    pub fn get(&self, stage: StageId) -> Option<&StageConfig> {
        match stage {
            StageId::Draft => self.draft.as_ref(),
            StageId::Critique => self.critique.as_ref(),
            StageId::Review => self.review.as_ref(),
            StageId::Translate => self.translate.as_ref(),
        }
    }

    pub(crate) fn get_mut(&mut self, stage: StageId) -> &mut StageConfig {
        let slot = match stage {
            StageId::Draft => &mut self.draft,
            StageId::Critique => &mut self.critique,
            StageId::Review => &mut self.review,
            StageId::Translate => &mut self.translate,
        };
        slot.get_or_insert_with(StageConfig::default)
    }
}
