use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codecritic_utils::error::ConfigError;
use codecritic_utils::types::StageId;

use super::{
    BASE_URL_ENV, CliArgs, Config, ConfigSource, DEFAULT_PROVIDER, Defaults, LlmConfig, MODEL_ENV,
    OpenAiConfig, StagesConfig,
};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<Defaults>,
    llm: Option<LlmConfig>,
    stages: Option<StagesConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses current working directory for config file discovery when no explicit
    /// path is provided in cli_args.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_env(start_dir, cli_args, |key| std::env::var(key).ok())
    }

    /// Discovery with an injectable environment lookup.
    ///
    /// This is the variant used by tests to avoid process-global state.
    pub fn discover_with_env<F>(start_dir: &Path, cli_args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut source_attribution = HashMap::new();

        // Start with built-in defaults
        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut stages = StagesConfig::default();

        source_attribution.insert("model".to_string(), ConfigSource::Default);
        source_attribution.insert("stage_timeout".to_string(), ConfigSource::Default);
        source_attribution.insert("verbose".to_string(), ConfigSource::Default);
        source_attribution.insert("critique_enabled".to_string(), ConfigSource::Default);

        let config_path = if let Some(explicit_path) = &cli_args.config_path {
            if !explicit_path.is_file() {
                return Err(ConfigError::NotFound {
                    path: explicit_path.display().to_string(),
                }
                .into());
            }
            Some(explicit_path.clone())
        } else {
            Self::discover_config_file_from(start_dir)?
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded configuration file");

            let config_source = ConfigSource::Config;

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.model.is_some() {
                    defaults.model = file_defaults.model;
                    source_attribution.insert("model".to_string(), config_source.clone());
                }
                if file_defaults.stage_timeout.is_some() {
                    defaults.stage_timeout = file_defaults.stage_timeout;
                    source_attribution.insert("stage_timeout".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
                if file_defaults.language.is_some() {
                    defaults.language = file_defaults.language;
                    source_attribution.insert("language".to_string(), config_source.clone());
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm_provider".to_string(), config_source.clone());
                }
                if let Some(file_openai) = file_llm.openai {
                    for (key, present) in [
                        ("llm_openai_api_key_env", file_openai.api_key_env.is_some()),
                        ("llm_openai_base_url", file_openai.base_url.is_some()),
                        ("llm_openai_max_tokens", file_openai.max_tokens.is_some()),
                        ("llm_openai_max_retries", file_openai.max_retries.is_some()),
                    ] {
                        if present {
                            source_attribution.insert(key.to_string(), config_source.clone());
                        }
                    }
                    llm.openai = Some(file_openai);
                }
            }

            if let Some(file_stages) = file_config.stages {
                if file_stages.critique_enabled.is_some() {
                    source_attribution
                        .insert("critique_enabled".to_string(), config_source.clone());
                }
                for stage in StageId::ALL {
                    if file_stages.get(stage).is_some() {
                        source_attribution.insert(format!("stages.{stage}"), config_source.clone());
                    }
                }
                stages = file_stages;
            }
        }

        // Environment overrides the config file
        if let Some(env_model) = env(MODEL_ENV).filter(|v| !v.is_empty()) {
            defaults.model = Some(env_model);
            source_attribution.insert("model".to_string(), ConfigSource::Env);
        }
        if let Some(env_base_url) = env(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            llm.openai
                .get_or_insert_with(OpenAiConfig::default)
                .base_url = Some(env_base_url);
            source_attribution.insert("llm_openai_base_url".to_string(), ConfigSource::Env);
        }

        // Apply CLI overrides (highest priority)
        if let Some(model) = &cli_args.model {
            defaults.model = Some(model.clone());
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(stage_timeout) = cli_args.stage_timeout {
            defaults.stage_timeout = Some(stage_timeout);
            source_attribution.insert("stage_timeout".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(language) = &cli_args.language {
            defaults.language = Some(language.clone());
            source_attribution.insert("language".to_string(), ConfigSource::Cli);
        }
        if cli_args.no_critique {
            stages.critique_enabled = Some(false);
            source_attribution.insert("critique_enabled".to_string(), ConfigSource::Cli);
        }
        if let Some(provider) = &cli_args.llm_provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }

        if llm.provider.is_none() {
            llm.provider = Some(DEFAULT_PROVIDER.to_string());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Default);
        }

        let config = Self {
            defaults,
            llm,
            stages,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.codecritic/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".codecritic").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
