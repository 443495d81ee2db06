//! Text-generation backend abstraction
//!
//! Every provider implements [`LlmBackend`], so the review pipeline can run
//! against any of them (or a scripted double in tests) without knowing
//! implementation details.

pub(crate) mod http_client;
mod openai_backend;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use codecritic_utils::error::LlmError;
pub use types::{
    LlmBackend, LlmInvocation, LlmResult, METADATA_MAX_TOKENS, METADATA_RESPONSE_FORMAT,
    METADATA_TEMPERATURE, Message, Role,
};

pub(crate) use openai_backend::OpenAiBackend;

use codecritic_config::Config;

/// Construct a backend for a specific provider.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown.
/// Returns `LlmError::Misconfiguration` if provider-specific configuration is invalid.
fn construct_backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match provider {
        "openai" => {
            let backend = OpenAiBackend::new_from_config(config)?;
            Ok(Arc::new(backend))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{}'. Supported providers: openai.",
            unknown
        ))),
    }
}

/// Create an LLM backend from configuration.
///
/// The returned handle is shared by every stage of a run.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown and
/// `LlmError::Misconfiguration` if the API key is missing.
pub fn from_config(config: &Config) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let provider = config.provider();
    tracing::debug!(provider = provider, "Constructing LLM backend");
    construct_backend_for_provider(provider, config)
}
