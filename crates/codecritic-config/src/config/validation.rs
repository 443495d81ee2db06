use codecritic_utils::error::ConfigError;
use codecritic_utils::types::StageId;

use super::{Config, KNOWN_PROVIDERS};

const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 7200;
const MAX_TEMPERATURE: f64 = 2.0;
const MAX_RETRIES: u32 = 5;

fn invalid(key: impl Into<String>, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    }
}

fn validate_timeout(key: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < MIN_TIMEOUT_SECS {
        return Err(invalid(key, "must be at least 5 seconds"));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(invalid(
            key,
            "exceeds maximum limit of 7200 seconds (2 hours)",
        ));
    }
    Ok(())
}

fn validate_model(key: &str, model: &str) -> Result<(), ConfigError> {
    if model.trim().is_empty() {
        return Err(invalid(key, "model name cannot be empty"));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.defaults.model {
            validate_model("model", model)?;
        }

        if let Some(stage_timeout) = self.defaults.stage_timeout {
            validate_timeout("stage_timeout", stage_timeout)?;
        }

        if let Some(language) = &self.defaults.language
            && language.trim().is_empty()
        {
            return Err(invalid("language", "target language cannot be empty"));
        }

        if let Some(provider) = &self.llm.provider
            && !KNOWN_PROVIDERS.contains(&provider.as_str())
        {
            return Err(invalid(
                "llm_provider",
                format!(
                    "Unknown provider '{provider}'. Supported: {}",
                    KNOWN_PROVIDERS.join(", ")
                ),
            ));
        }

        if let Some(openai) = &self.llm.openai {
            if let Some(max_retries) = openai.max_retries
                && max_retries > MAX_RETRIES
            {
                return Err(invalid("llm.openai.max_retries", "exceeds maximum limit of 5"));
            }
            if openai.max_tokens == Some(0) {
                return Err(invalid("llm.openai.max_tokens", "must be greater than 0"));
            }
            if let Some(base_url) = &openai.base_url
                && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
            {
                return Err(invalid(
                    "llm.openai.base_url",
                    format!("'{base_url}' is not an http(s) URL"),
                ));
            }
            if let Some(api_key_env) = &openai.api_key_env
                && api_key_env.trim().is_empty()
            {
                return Err(invalid("llm.openai.api_key_env", "cannot be empty"));
            }
        }

        for stage in StageId::ALL {
            let Some(stage_config) = self.stages.get(stage) else {
                continue;
            };
            if let Some(model) = &stage_config.model {
                validate_model(&format!("stages.{stage}.model"), model)?;
            }
            if let Some(timeout) = stage_config.timeout {
                validate_timeout(&format!("stages.{stage}.timeout"), timeout)?;
            }
            if let Some(temperature) = stage_config.temperature
                && !(0.0..=MAX_TEMPERATURE).contains(&temperature)
            {
                return Err(invalid(
                    format!("stages.{stage}.temperature"),
                    "must be between 0.0 and 2.0",
                ));
            }
        }

        Ok(())
    }
}
