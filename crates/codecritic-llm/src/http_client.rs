//! Shared HTTP client infrastructure for the HTTP backend
//!
//! One `reqwest::Client` is built per backend and reused for every stage, so
//! the connection pool survives across the calls of a run.

use codecritic_utils::error::LlmError;
use codecritic_utils::redaction::redact_error_message;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default maximum HTTP timeout (2 hours, the largest configurable stage timeout)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(7200);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial backoff duration for retries (1 second)
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Shared HTTP client for the generation service
///
/// Provides connection reuse, per-request timeouts, and an opt-in bounded
/// retry with linear backoff for 5xx and network failures.
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// `max_retries` of zero disables retrying entirely.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new(max_retries: u32) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout: DEFAULT_MAX_HTTP_TIMEOUT,
            max_retries,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    #[cfg(test)]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Start a POST request on the shared client
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Execute an HTTP request with timeout and retry policy
    ///
    /// - Per-request timeout: `min(request_timeout, max_timeout)`
    /// - Up to `max_retries` retries for 5xx and network failures
    /// - Linear backoff: 1s, 2s, ...
    /// - No retries for 4xx errors or timeouts
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403 errors
    /// - `LlmError::ProviderQuota` for 429 errors
    /// - `LlmError::Transport` for other 4xx errors and network errors
    /// - `LlmError::ProviderOutage` for 5xx errors
    /// - `LlmError::Timeout` for timeouts
    pub async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| {
                    LlmError::Transport("Failed to clone request for retry".to_string())
                })?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("Failed to build request: {}", e)))?;

            debug!(
                provider = provider_name,
                attempt = attempt,
                timeout_secs = effective_timeout.as_secs(),
                "Executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_client_error() {
                        return Err(map_client_error(status, provider_name));
                    }

                    if status.is_server_error() {
                        if attempt <= self.max_retries {
                            warn!(
                                provider = provider_name,
                                attempt = attempt,
                                status = status.as_u16(),
                                "Server error, will retry"
                            );
                            tokio::time::sleep(self.initial_backoff * attempt).await;
                            continue;
                        }

                        return Err(LlmError::ProviderOutage(format!(
                            "{} returned server error: {}",
                            provider_name, status
                        )));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(LlmError::Timeout {
                            duration: effective_timeout,
                        });
                    }

                    let message = redact_error_message(&e.to_string());

                    if attempt <= self.max_retries {
                        warn!(
                            provider = provider_name,
                            attempt = attempt,
                            error = %message,
                            "Network error, will retry"
                        );
                        tokio::time::sleep(self.initial_backoff * attempt).await;
                        continue;
                    }

                    return Err(LlmError::Transport(format!(
                        "{} request failed: {}",
                        provider_name, message
                    )));
                }
            }
        }
    }
}

/// Map HTTP client error status codes to LlmError variants
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - Other 4xx → `LlmError::Transport`
pub(crate) fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{} authentication failed: {}",
            provider_name, status
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{} rate limit exceeded: {}", provider_name, status))
        }
        _ => LlmError::Transport(format!(
            "{} returned client error: {}",
            provider_name, status
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        let client = HttpClient::new(0);
        assert!(client.is_ok(), "Should construct HTTP client successfully");
    }

    #[test]
    fn test_map_client_error_auth() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let error = map_client_error(status, "openai");
            assert!(matches!(error, LlmError::ProviderAuth(_)));
        }
    }

    #[test]
    fn test_map_client_error_quota() {
        let error = map_client_error(StatusCode::TOO_MANY_REQUESTS, "openai");
        assert!(matches!(error, LlmError::ProviderQuota(_)));
    }

    #[test]
    fn test_map_client_error_other_4xx() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND, StatusCode::UNPROCESSABLE_ENTITY] {
            let error = map_client_error(status, "openai");
            assert!(matches!(error, LlmError::Transport(_)));
            assert!(error.to_string().contains(status.as_str()));
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClient::new(0).unwrap();
        let request = client.post(&format!("http://{addr}/chat/completions"));
        let result = client
            .execute_with_retry(request, Duration::from_secs(5), "openai")
            .await;

        assert!(matches!(result, Err(LlmError::Transport(_))));
    }
}
