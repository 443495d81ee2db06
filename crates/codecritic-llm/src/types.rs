//! Core types for LLM backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use codecritic_utils::error::LlmError;

/// Metadata key carrying the sampling temperature (`f64`)
pub const METADATA_TEMPERATURE: &str = "temperature";

/// Metadata key carrying the `response_format` object sent verbatim to the service
pub const METADATA_RESPONSE_FORMAT: &str = "response_format";

/// Metadata key carrying an output token cap (`u64`)
pub const METADATA_MAX_TOKENS: &str = "max_tokens";

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions
    System,
    /// User input
    User,
    /// Assistant turn (prior stage output presented as context)
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to an LLM backend invocation
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Stage issuing the call, for logs
    pub stage: String,
    /// Model to use for this invocation
    pub model: String,
    /// Timeout for this invocation
    pub timeout: Duration,
    /// Ordered list of messages in the conversation
    pub messages: Vec<Message>,
    /// Provider-specific metadata (temperature, response_format, max_tokens)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            stage: stage.into(),
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the invocation
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sampling temperature from metadata, if present
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.metadata
            .get(METADATA_TEMPERATURE)
            .and_then(serde_json::Value::as_f64)
    }
}

/// Result from an LLM backend invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Raw message content; empty when the service returned no content
    pub raw_response: String,
    /// Provider name (e.g., "openai")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    /// Input tokens consumed (if available)
    pub tokens_input: Option<u64>,
    /// Output tokens generated (if available)
    pub tokens_output: Option<u64>,
    /// Service-reported finish reason (if available)
    pub finish_reason: Option<String>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            finish_reason: None,
        }
    }

    /// Set token counts
    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// A text-generation service the review stages talk to.
///
/// Implementations must be shareable across tasks; one backend instance
/// serves every stage of a run and any number of concurrent runs.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Perform one chat-completion round-trip.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_invocation_metadata() {
        let inv = LlmInvocation::new("draft", "m", Duration::from_secs(5), vec![])
            .with_metadata(METADATA_TEMPERATURE, json!(0.3));
        assert_eq!(inv.temperature(), Some(0.3));
        assert!(!inv.metadata.contains_key(METADATA_RESPONSE_FORMAT));
    }

    #[test]
    fn test_result_with_tokens() {
        let result = LlmResult::new("{}", "openai", "gpt-4o-mini").with_tokens(10, 20);
        assert_eq!(result.tokens_input, Some(10));
        assert_eq!(result.tokens_output, Some(20));
        assert_eq!(result.finish_reason, None);
    }
}
