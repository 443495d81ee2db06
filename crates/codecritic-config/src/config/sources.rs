use std::collections::BTreeMap;

use codecritic_utils::types::StageId;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).label().to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Keys are sorted so `codecritic config` output is stable.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, attribution_key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(attribution_key));
                config.insert(key.to_string(), (val, source));
            }
        };

        add_config("model", "model", Some(self.default_model()));
        add_config(
            "stage_timeout",
            "stage_timeout",
            self.defaults.stage_timeout.map(|t| t.to_string()),
        );
        add_config("verbose", "verbose", Some(self.verbose().to_string()));
        add_config("language", "language", self.defaults.language.clone());
        add_config(
            "critique_enabled",
            "critique_enabled",
            Some(self.critique_enabled().to_string()),
        );
        add_config("llm_provider", "llm_provider", Some(self.provider().to_string()));
        add_config(
            "llm_openai_api_key_env",
            "llm_openai_api_key_env",
            Some(self.api_key_env().to_string()),
        );
        add_config(
            "llm_openai_base_url",
            "llm_openai_base_url",
            self.llm.openai.as_ref().and_then(|o| o.base_url.clone()),
        );
        add_config(
            "llm_openai_max_tokens",
            "llm_openai_max_tokens",
            self.llm
                .openai
                .as_ref()
                .and_then(|o| o.max_tokens)
                .map(|t| t.to_string()),
        );
        add_config(
            "llm_openai_max_retries",
            "llm_openai_max_retries",
            Some(self.max_retries().to_string()),
        );

        for stage in StageId::ALL {
            let Some(stage_config) = self.stages.get(stage) else {
                continue;
            };
            let attribution_key = format!("stages.{stage}");
            add_config(
                &format!("stages.{stage}.model"),
                &attribution_key,
                stage_config.model.clone(),
            );
            add_config(
                &format!("stages.{stage}.temperature"),
                &attribution_key,
                stage_config.temperature.map(|t| t.to_string()),
            );
            add_config(
                &format!("stages.{stage}.timeout"),
                &attribution_key,
                stage_config.timeout.map(|t| t.to_string()),
            );
        }

        config
    }
}
