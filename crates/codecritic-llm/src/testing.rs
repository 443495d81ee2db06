//! Scripted backend for tests
//!
//! Replays a queue of canned outcomes in order and records every invocation
//! it receives, so tests can assert on the exact conversation each stage sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use codecritic_utils::error::LlmError;

/// Provider name reported in scripted results
pub const SCRIPTED_PROVIDER: &str = "scripted";

/// A backend that answers from a script instead of the network.
///
/// When the script runs dry every further call fails with `LlmError::Transport`.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<LlmResult, LlmError>>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend that returns each content string in turn.
    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for response in responses {
            backend.push_response(response);
        }
        backend
    }

    /// Queue a successful response with the given message content.
    pub fn push_response(&self, content: impl Into<String>) {
        lock(&self.script).push_back(Ok(LlmResult::new(content, SCRIPTED_PROVIDER, "scripted-model")));
    }

    /// Queue a complete result (e.g. one carrying token usage).
    pub fn push_result(&self, result: LlmResult) {
        lock(&self.script).push_back(Ok(result));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: LlmError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Every invocation received so far, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        lock(&self.invocations).clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.invocations).len()
    }

    /// Number of scripted outcomes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        lock(&self.invocations).push(inv);
        lock(&self.script).pop_front().unwrap_or_else(|| {
            Err(LlmError::Transport(
                "scripted backend has no responses left".to_string(),
            ))
        })
    }
}
