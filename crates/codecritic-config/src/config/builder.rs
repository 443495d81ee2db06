use std::collections::HashMap;
use std::time::Duration;

use codecritic_utils::error::ConfigError;
use codecritic_utils::types::StageId;

use super::{
    Config, ConfigSource, DEFAULT_PROVIDER, Defaults, LlmConfig, OpenAiConfig, StagesConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the review pipeline without relying on
    /// environment variables or config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use codecritic_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .model("gpt-4o")
    ///     .stage_timeout(Duration::from_secs(300))
    ///     .critique_enabled(false)
    ///     .build()
    ///     .expect("Failed to build config");
    /// assert!(!config.critique_enabled());
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`
/// in the resulting `Config`'s source attribution map.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    stage_timeout: Option<Duration>,
    verbose: Option<bool>,
    language: Option<String>,
    critique_enabled: Option<bool>,
    llm_provider: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
    max_retries: Option<u32>,
    stage_models: Vec<(StageId, String)>,
    stage_temperatures: Vec<(StageId, f64)>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default model for all stages.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the per-stage timeout. Sub-second precision is truncated.
    #[must_use]
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set the target language for the translation stage.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn critique_enabled(mut self, enabled: bool) -> Self {
        self.critique_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.llm_provider = Some(provider.into());
        self
    }

    /// Name the environment variable holding the API key.
    #[must_use]
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = Some(name.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Override the model for one stage.
    #[must_use]
    pub fn stage_model(mut self, stage: StageId, model: impl Into<String>) -> Self {
        self.stage_models.push((stage, model.into()));
        self
    }

    /// Override the sampling temperature for one stage.
    #[must_use]
    pub fn stage_temperature(mut self, stage: StageId, temperature: f64) -> Self {
        self.stage_temperatures.push((stage, temperature));
        self
    }

    /// Build the `Config`, validating every value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut mark = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        mark("model", self.model.is_some());
        mark("stage_timeout", self.stage_timeout.is_some());
        mark("verbose", self.verbose.is_some());
        mark("critique_enabled", self.critique_enabled.is_some());
        mark("llm_provider", self.llm_provider.is_some());
        if self.language.is_some() {
            mark("language", true);
        }

        let base = Defaults::default();
        let defaults = Defaults {
            model: self.model,
            stage_timeout: self
                .stage_timeout
                .map(|d| d.as_secs())
                .or(base.stage_timeout),
            verbose: self.verbose.or(base.verbose),
            language: self.language,
        };

        let has_openai = self.api_key_env.is_some()
            || self.base_url.is_some()
            || self.max_tokens.is_some()
            || self.max_retries.is_some();
        for (key, set) in [
            ("llm_openai_api_key_env", self.api_key_env.is_some()),
            ("llm_openai_base_url", self.base_url.is_some()),
            ("llm_openai_max_tokens", self.max_tokens.is_some()),
            ("llm_openai_max_retries", self.max_retries.is_some()),
        ] {
            if set {
                mark(key, true);
            }
        }
        let llm = LlmConfig {
            provider: Some(
                self.llm_provider
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            ),
            openai: has_openai.then(|| OpenAiConfig {
                api_key_env: self.api_key_env,
                base_url: self.base_url,
                max_tokens: self.max_tokens,
                max_retries: self.max_retries,
            }),
        };

        let mut stages = StagesConfig {
            critique_enabled: self.critique_enabled,
            ..StagesConfig::default()
        };
        for (stage, model) in self.stage_models {
            stages.get_mut(stage).model = Some(model);
            mark(&format!("stages.{stage}"), true);
        }
        for (stage, temperature) in self.stage_temperatures {
            stages.get_mut(stage).temperature = Some(temperature);
            mark(&format!("stages.{stage}"), true);
        }

        let config = Config {
            defaults,
            llm,
            stages,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
