//! Stage execution
//!
//! One stage is one bounded round-trip to the generation service with a fixed
//! conversation, a strict response format and a temperature. The response is
//! parsed and decoded into the stage's structural type; nothing partial
//! escapes on failure.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use codecritic_llm::{
    LlmBackend, LlmInvocation, METADATA_RESPONSE_FORMAT, METADATA_TEMPERATURE, Message,
};
use codecritic_utils::error::{PipelineError, StageError};
use codecritic_utils::logging::{log_stage_error, log_stage_start, stage_span};
use codecritic_utils::types::StageId;

use crate::model::Validate;

/// Everything needed to run one stage
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub stage: StageId,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f64,
    pub response_format: &'static Value,
    pub messages: Vec<Message>,
}

impl StageRequest {
    /// Build the backend invocation for this request.
    #[must_use]
    pub fn to_invocation(&self) -> LlmInvocation {
        LlmInvocation::new(
            self.stage.as_str(),
            self.model.clone(),
            self.timeout,
            self.messages.clone(),
        )
        .with_metadata(METADATA_TEMPERATURE, Value::from(self.temperature))
        .with_metadata(METADATA_RESPONSE_FORMAT, self.response_format.clone())
    }
}

/// A decoded stage result plus what the service reported about the call
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub value: T,
    pub elapsed: Duration,
    pub tokens_output: Option<u64>,
}

/// Runs stages against a shared backend
#[derive(Clone)]
pub struct StageExecutor {
    backend: Arc<dyn LlmBackend>,
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor").finish_non_exhaustive()
    }
}

impl StageExecutor {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Run one stage and decode its response into `T`.
    ///
    /// # Errors
    ///
    /// `PipelineError::Llm` if the backend call fails, otherwise
    /// `PipelineError::Stage` if the content is empty, not JSON, or does not
    /// fit `T`.
    pub async fn execute<T>(&self, request: StageRequest) -> Result<StageOutput<T>, PipelineError>
    where
        T: DeserializeOwned + Validate,
    {
        let stage = request.stage;
        let span = stage_span(stage, &request.model);

        async move {
            log_stage_start(stage, &request.model);
            let started = Instant::now();

            let result = match self.backend.invoke(request.to_invocation()).await {
                Ok(result) => result,
                Err(source) => {
                    log_stage_error(stage, &source.to_string(), started.elapsed().as_millis());
                    return Err(PipelineError::Llm { stage, source });
                }
            };
            let elapsed = started.elapsed();

            if let Some(tokens) = result.tokens_output {
                tracing::info!(
                    stage = %stage,
                    tokens_output = tokens,
                    "Stage used completion tokens"
                );
            }
            if let Some(reason) = result.finish_reason.as_deref()
                && reason != "stop"
            {
                tracing::warn!(stage = %stage, finish_reason = reason, "Completion did not stop normally");
            }

            match parse_stage_output::<T>(stage, &result.raw_response) {
                Ok(value) => Ok(StageOutput {
                    value,
                    elapsed,
                    tokens_output: result.tokens_output,
                }),
                Err(err) => {
                    log_stage_error(stage, &err.to_string(), elapsed.as_millis());
                    Err(err.into())
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Parse raw completion content into the stage's structural type.
///
/// # Errors
///
/// `EmptyResponse` for blank content, `MalformedJson` when the content is not
/// JSON, and `SchemaMismatch` when it does not decode into `T` or violates
/// `T`'s invariants.
pub fn parse_stage_output<T>(stage: StageId, raw: &str) -> Result<T, StageError>
where
    T: DeserializeOwned + Validate,
{
    if raw.trim().is_empty() {
        return Err(StageError::EmptyResponse { stage });
    }

    let parsed: Value = serde_json::from_str(raw).map_err(|source| {
        tracing::debug!(stage = %stage, raw = raw, "Raw model response");
        StageError::MalformedJson { stage, source }
    })?;

    let value: T = serde_json::from_value(parsed.clone()).map_err(|err| {
        tracing::debug!(stage = %stage, payload = %parsed, "Parsed payload did not match");
        StageError::SchemaMismatch {
            stage,
            reason: err.to_string(),
        }
    })?;

    value
        .validate()
        .map_err(|reason| StageError::SchemaMismatch { stage, reason })?;
    Ok(value)
}
