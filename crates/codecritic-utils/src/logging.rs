//! Logging and observability infrastructure for codecritic
//!
//! Structured logging via `tracing`, written to stderr so that stdout stays
//! reserved for the review result.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;
use crate::types::StageId;

/// Initialize tracing subscriber for structured logging
///
/// `RUST_LOG` wins when set. Otherwise verbose mode enables debug output for
/// the codecritic crates and span close events carrying stage timings.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new(
                    "codecritic=debug,codecritic_engine=debug,codecritic_llm=debug,codecritic_config=debug,info",
                )
            } else {
                EnvFilter::try_new("codecritic=info,codecritic_engine=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one stage execution
pub fn stage_span(stage: StageId, model: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "stage_execution",
        stage = %stage,
        model = %model,
    )
}

/// Log stage start
pub fn log_stage_start(stage: StageId, model: &str) {
    info!(stage = %stage, model = %model, "{} started", stage.label());
}

/// Log stage completion with duration and issue count
pub fn log_stage_complete(stage: StageId, duration_ms: u128, issues: usize) {
    info!(
        stage = %stage,
        duration_ms = %duration_ms,
        issues = issues,
        "{} completed",
        stage.label()
    );
}

/// Log stage failure.
///
/// Error messages are redacted to prevent secrets from appearing in logs.
pub fn log_stage_error(stage: StageId, error: &str, duration_ms: u128) {
    let sanitized_error = redact_error_message(error);
    error!(
        stage = %stage,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "{} failed",
        stage.label()
    );
}
