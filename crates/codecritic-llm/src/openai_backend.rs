//! OpenAI-compatible chat completions backend
//!
//! Works against any service exposing `POST <base_url>/chat/completions` with
//! structured output via `response_format`.

use crate::http_client::HttpClient;
use crate::types::{
    LlmBackend, LlmInvocation, LlmResult, METADATA_MAX_TOKENS, METADATA_RESPONSE_FORMAT,
    METADATA_TEMPERATURE, Message,
};
use async_trait::async_trait;
use codecritic_config::{BASE_URL_ENV, Config, DEFAULT_BASE_URL};
use codecritic_utils::error::LlmError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "openai";

/// OpenAI-compatible backend
#[derive(Clone)]
pub(crate) struct OpenAiBackend {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    default_max_tokens: Option<u32>,
}

impl OpenAiBackend {
    /// Create a new backend.
    ///
    /// `base_url` is the API root; `/chat/completions` is appended.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: &str,
        default_max_tokens: Option<u32>,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new(max_retries)?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            default_max_tokens,
        })
    }

    /// Create a backend from configuration
    ///
    /// Base URL precedence: `[llm.openai].base_url` (already merged with
    /// `ANALYZER_BASE_URL` during discovery) > `ANALYZER_BASE_URL` > public endpoint.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable
    /// is not set or the HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let api_key_env = config.api_key_env();
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "API key not found in environment variable '{}'. \
                     Please set this variable or configure a different api_key_env in [llm.openai].",
                    api_key_env
                ))
            })?;

        let openai = config.llm.openai.as_ref();
        let base_url = openai
            .and_then(|o| o.base_url.clone())
            .or_else(|| std::env::var(BASE_URL_ENV).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self::new(
            api_key,
            &base_url,
            openai.and_then(|o| o.max_tokens),
            config.max_retries(),
        )
    }

    fn build_request(&self, inv: &LlmInvocation) -> ChatCompletionRequest {
        let max_tokens = inv
            .metadata
            .get(METADATA_MAX_TOKENS)
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .or(self.default_max_tokens);

        ChatCompletionRequest {
            model: inv.model.clone(),
            messages: convert_messages(&inv.messages),
            temperature: inv
                .metadata
                .get(METADATA_TEMPERATURE)
                .and_then(serde_json::Value::as_f64),
            response_format: inv.metadata.get(METADATA_RESPONSE_FORMAT).cloned(),
            max_tokens,
        }
    }
}

/// Convert messages to the wire format
fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|msg| WireMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        })
        .collect()
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let request_body = self.build_request(&inv);

        debug!(
            provider = PROVIDER,
            stage = %inv.stage,
            model = %request_body.model,
            temperature = ?request_body.temperature,
            max_tokens = ?request_body.max_tokens,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat completions"
        );

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, PROVIDER)
            .await?;

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    duration: inv.timeout,
                }
            } else {
                LlmError::Transport(format!("Failed to parse chat completion response: {}", e))
            }
        })?;

        let choice = response_body.choices.into_iter().next().ok_or_else(|| {
            LlmError::Transport("Chat completion response missing choices[0]".to_string())
        })?;

        // null content is passed on as empty; the caller decides what that means
        let content = choice.message.content.unwrap_or_default();

        let model_used = response_body.model.unwrap_or(request_body.model);
        let mut result = LlmResult::new(content, PROVIDER, model_used);
        result.finish_reason = choice.finish_reason;

        if let Some(usage) = response_body.usage {
            result.tokens_input = Some(usage.prompt_tokens);
            result.tokens_output = Some(usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            stage = %inv.stage,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            finish_reason = ?result.finish_reason,
            "Chat completion received"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

/// Request body
#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
