//! Review pipeline orchestration
//!
//! Draft → Critique → Review → (optional) Translate, then filename
//! reconciliation. Each stage receives the previous stage's result by
//! reference and returns a new value; there is no shared mutable run state.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use codecritic_config::Config;
use codecritic_llm::{LlmBackend, LlmError, Message};
use codecritic_utils::error::PipelineError;
use codecritic_utils::logging::log_stage_complete;
use codecritic_utils::types::StageId;

use crate::embed::{embed_files, source_listing};
use crate::model::{DraftResult, ReviewResult};
use crate::prompts;
use crate::reconcile::FilenameReconciler;
use crate::schema;
use crate::stage::{StageExecutor, StageOutput, StageRequest};

pub const DRAFT_TEMPERATURE: f64 = 0.3;
pub const CRITIQUE_TEMPERATURE: f64 = 0.2;
pub const REVIEW_TEMPERATURE: f64 = 0.1;
pub const TRANSLATE_TEMPERATURE: f64 = 0.1;

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(600);

/// Per-stage knobs
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    /// Overrides the model passed to [`ReviewPipeline::run`]
    pub model: Option<String>,
    pub temperature: f64,
    pub timeout: Duration,
}

impl StageOptions {
    fn with_temperature(temperature: f64) -> Self {
        Self {
            model: None,
            temperature,
            timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub critique_enabled: bool,
    pub draft: StageOptions,
    pub critique: StageOptions,
    pub review: StageOptions,
    pub translate: StageOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            critique_enabled: true,
            draft: StageOptions::with_temperature(DRAFT_TEMPERATURE),
            critique: StageOptions::with_temperature(CRITIQUE_TEMPERATURE),
            review: StageOptions::with_temperature(REVIEW_TEMPERATURE),
            translate: StageOptions::with_temperature(TRANSLATE_TEMPERATURE),
        }
    }
}

impl PipelineOptions {
    /// Derive options from resolved configuration.
    ///
    /// Stage models are only set when the stage section names one, so the
    /// model passed to `run` stays the default.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut options = Self {
            critique_enabled: config.critique_enabled(),
            ..Self::default()
        };
        for stage in StageId::ALL {
            let stage_options = options.get_mut(stage);
            stage_options.model = config.stages.get(stage).and_then(|sc| sc.model.clone());
            stage_options.timeout = config.timeout_for_stage(stage);
            if let Some(temperature) = config.temperature_for_stage(stage) {
                stage_options.temperature = temperature;
            }
        }
        options
    }

    /// Apply one timeout to every stage.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        for stage in StageId::ALL {
            self.get_mut(stage).timeout = timeout;
        }
        self
    }

    #[must_use]
    pub fn with_critique(mut self, enabled: bool) -> Self {
        self.critique_enabled = enabled;
        self
    }

    #[must_use]
    pub fn get(&self, stage: StageId) -> &StageOptions {
        match stage {
            StageId::Draft => &self.draft,
            StageId::Critique => &self.critique,
            StageId::Review => &self.review,
            StageId::Translate => &self.translate,
        }
    }

    fn get_mut(&mut self, stage: StageId) -> &mut StageOptions {
        match stage {
            StageId::Draft => &mut self.draft,
            StageId::Critique => &mut self.critique,
            StageId::Review => &mut self.review,
            StageId::Translate => &mut self.translate,
        }
    }
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    // Stage results are plain structs with string keys
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Values shared by every stage of one run
struct RunContext<'a> {
    model: &'a str,
    listing: String,
}

/// Drives one review run end to end
#[derive(Debug, Clone)]
pub struct ReviewPipeline {
    executor: StageExecutor,
    options: PipelineOptions,
}

impl ReviewPipeline {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, options: PipelineOptions) -> Self {
        Self {
            executor: StageExecutor::new(backend),
            options,
        }
    }

    /// Build a pipeline with the backend and options described by `config`.
    ///
    /// # Errors
    ///
    /// Propagates backend construction failures (unknown provider, missing key).
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let backend = codecritic_llm::from_config(config)?;
        Ok(Self::new(backend, PipelineOptions::from_config(config)))
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Review `files` and return the verified, reconciled result.
    ///
    /// # Errors
    ///
    /// `NoSourceFiles` when nothing is embeddable; otherwise the first stage
    /// failure. No partial result is ever returned.
    pub async fn run(
        &self,
        model: &str,
        files: &HashMap<String, String>,
        draft_prompt: &str,
        target_language: Option<&str>,
    ) -> Result<ReviewResult, PipelineError> {
        let embedding = embed_files(files);
        if embedding.files.is_empty() {
            return Err(PipelineError::NoSourceFiles {
                skipped: embedding.skipped.len(),
            });
        }

        let span = tracing::info_span!("review_run", model = model, files = embedding.files.len());
        async move {
            let started = Instant::now();
            let ctx = RunContext {
                model,
                listing: source_listing(&embedding.files),
            };

            let draft = self.draft(&ctx, draft_prompt).await?;
            let candidates = if self.options.critique_enabled {
                self.critique(&ctx, &draft).await?
            } else {
                tracing::info!("Critique stage disabled; reviewing draft candidates directly");
                draft
            };
            let mut review = self.review(&ctx, &candidates).await?;
            if let Some(language) = target_language {
                review = self.translate(&ctx, &review, language).await?;
            }

            if review.summary.trim().is_empty() {
                tracing::warn!("Final review has an empty summary");
            }

            let reconciler =
                FilenameReconciler::new(embedding.files.iter().map(|f| f.path.clone()));
            let review = reconciler.reconcile(review);

            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                issues = review.issues.len(),
                "Source code review completed"
            );
            Ok(review)
        }
        .instrument(span)
        .await
    }

    fn request(&self, ctx: &RunContext<'_>, stage: StageId, messages: Vec<Message>) -> StageRequest {
        let options = self.options.get(stage);
        let response_format = match stage {
            StageId::Draft => schema::draft_result_format(),
            StageId::Critique => schema::critique_result_format(),
            StageId::Review | StageId::Translate => schema::review_result_format(),
        };
        StageRequest {
            stage,
            model: options.model.clone().unwrap_or_else(|| ctx.model.to_string()),
            timeout: options.timeout,
            temperature: options.temperature,
            response_format,
            messages,
        }
    }

    async fn draft(&self, ctx: &RunContext<'_>, draft_prompt: &str) -> Result<DraftResult, PipelineError> {
        let request = self.request(
            ctx,
            StageId::Draft,
            vec![Message::system(draft_prompt), Message::user(ctx.listing.clone())],
        );
        let StageOutput { value, elapsed, .. } = self.executor.execute::<DraftResult>(request).await?;

        let emitted = value.candidate_issues.len();
        if value.stats.candidate_issue_count != emitted as u64 {
            tracing::warn!(
                reported = value.stats.candidate_issue_count,
                emitted,
                "Draft stats disagree with emitted candidate issues"
            );
        }
        log_stage_complete(StageId::Draft, elapsed.as_millis(), emitted);
        tracing::debug!(result = %pretty_json(&value), "Draft result");
        Ok(value)
    }

    async fn critique(&self, ctx: &RunContext<'_>, draft: &DraftResult) -> Result<DraftResult, PipelineError> {
        let request = self.request(
            ctx,
            StageId::Critique,
            vec![
                Message::system(prompts::CRITIQUE_SYSTEM_PROMPT),
                Message::user(ctx.listing.clone()),
                Message::assistant(format!("{}{}", prompts::DRAFT_CONTEXT_PREFIX, pretty_json(draft))),
                Message::user(prompts::CRITIQUE_INSTRUCTION),
            ],
        );
        let StageOutput { value, elapsed, .. } = self.executor.execute::<DraftResult>(request).await?;

        tracing::info!(
            surviving = value.candidate_issues.len(),
            drafted = draft.candidate_issues.len(),
            "Critique filtered candidate issues"
        );
        log_stage_complete(StageId::Critique, elapsed.as_millis(), value.candidate_issues.len());
        tracing::debug!(result = %pretty_json(&value), "Critique result");
        Ok(value)
    }

    async fn review(&self, ctx: &RunContext<'_>, candidates: &DraftResult) -> Result<ReviewResult, PipelineError> {
        let request = self.request(
            ctx,
            StageId::Review,
            vec![
                Message::system(prompts::REVIEW_SYSTEM_PROMPT),
                Message::user(ctx.listing.clone()),
                Message::assistant(format!(
                    "{}{}",
                    prompts::CRITIQUE_CONTEXT_PREFIX,
                    pretty_json(candidates)
                )),
                Message::user(prompts::REVIEW_INSTRUCTION),
            ],
        );
        let StageOutput { value, elapsed, .. } = self.executor.execute::<ReviewResult>(request).await?;

        log_stage_complete(StageId::Review, elapsed.as_millis(), value.issues.len());
        tracing::debug!(result = %pretty_json(&value), "Review result");
        Ok(value)
    }

    async fn translate(
        &self,
        ctx: &RunContext<'_>,
        review: &ReviewResult,
        language: &str,
    ) -> Result<ReviewResult, PipelineError> {
        let request = self.request(
            ctx,
            StageId::Translate,
            vec![
                Message::system(prompts::translate_system_prompt(language)),
                Message::user(format!("{}{}", prompts::TRANSLATE_CONTEXT_PREFIX, pretty_json(review))),
            ],
        );
        let StageOutput { value, elapsed, .. } = self.executor.execute::<ReviewResult>(request).await?;

        if value.issues.len() != review.issues.len() {
            tracing::warn!(
                before = review.issues.len(),
                after = value.issues.len(),
                "Translation changed the number of issues"
            );
        }
        log_stage_complete(StageId::Translate, elapsed.as_millis(), value.issues.len());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecritic_llm::testing::ScriptedBackend;
    use codecritic_llm::{METADATA_RESPONSE_FORMAT, Role};
    use codecritic_utils::error::StageError;
    use serde_json::json;

    fn files() -> HashMap<String, String> {
        HashMap::from([
            ("src/calc.c".to_string(), "int div(int a, int b) {\n  return a / b;\n}\n".to_string()),
            ("README.md".to_string(), "# calc".to_string()),
        ])
    }

    fn draft_json(file: &str, line: i64) -> String {
        json!({
            "stats": {"files": 1, "total_lines": 4, "candidate_issue_count": 1},
            "reasoning_trace": "b may be zero",
            "observations": [{"file": file, "note": "tiny"}],
            "candidate_issues": [{
                "file": file,
                "category": "arithmetic",
                "severity": "major",
                "line": line,
                "title": "Division by zero",
                "reasoning": "no guard on b",
                "evidence": [{"line": line, "snippet": "return a / b;", "relevance": "divides"}],
                "why_it_matters": "crash",
                "suggested_fix": "check b",
                "confidence": "high",
                "false_positive_risk": "callers may guarantee b != 0"
            }]
        })
        .to_string()
    }

    fn review_json(file: &str, line: i64) -> String {
        json!({
            "summary": "Small, readable code with one unchecked arithmetic path.",
            "issues": [{"file": file, "severity": "high", "line": line, "explanation": "`b` may be zero"}]
        })
        .to_string()
    }

    fn pipeline(backend: &Arc<ScriptedBackend>, options: PipelineOptions) -> ReviewPipeline {
        ReviewPipeline::new(backend.clone(), options)
    }

    #[tokio::test]
    async fn test_full_run_threads_context() {
        let backend = Arc::new(ScriptedBackend::with_responses([
            draft_json("src/calc.c", 2),
            draft_json("src/calc.c", 2),
            review_json("calc.c", 2),
        ]));
        let result = pipeline(&backend, PipelineOptions::default())
            .run("gpt-test", &files(), "Find bugs.", None)
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].file, "src/calc.c");
        assert_eq!(result.issues[0].line, 2);

        let calls = backend.invocations();
        let stages: Vec<&str> = calls.iter().map(|c| c.stage.as_str()).collect();
        assert_eq!(stages, ["draft", "critique", "review"]);

        let draft = &calls[0];
        assert_eq!(draft.model, "gpt-test");
        assert_eq!(draft.temperature(), Some(DRAFT_TEMPERATURE));
        assert_eq!(draft.messages[0].role, Role::System);
        assert_eq!(draft.messages[0].content, "Find bugs.");
        assert!(draft.messages[1].content.contains("### FILE: src/calc.c"));
        assert!(draft.messages[1].content.contains("2:   return a / b;"));
        assert!(!draft.messages[1].content.contains("README"));

        let critique = &calls[1];
        assert_eq!(critique.temperature(), Some(CRITIQUE_TEMPERATURE));
        assert_eq!(
            critique.metadata[METADATA_RESPONSE_FORMAT]["json_schema"]["name"],
            "CritiqueResult"
        );
        let roles: Vec<Role> = critique.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant, Role::User]);
        assert!(critique.messages[2].content.starts_with("Draft analysis to critique:\n{"));
        assert_eq!(critique.messages[1].content, draft.messages[1].content);

        let review = &calls[2];
        assert_eq!(review.temperature(), Some(REVIEW_TEMPERATURE));
        assert!(review.messages[2].content.starts_with("Peer-reviewed candidate issues:\n"));
    }

    #[tokio::test]
    async fn test_critique_disabled_makes_two_calls() {
        let backend = Arc::new(ScriptedBackend::with_responses([
            draft_json("src/calc.c", 2),
            review_json("src/calc.c", 2),
        ]));
        let options = PipelineOptions::default().with_critique(false);
        pipeline(&backend, options)
            .run("m", &files(), "p", None)
            .await
            .unwrap();

        let calls = backend.invocations();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].stage, "review");
        assert!(calls[1].messages[2].content.contains("Division by zero"));
    }

    #[tokio::test]
    async fn test_translation_adds_fourth_call_and_is_reconciled() {
        let backend = Arc::new(ScriptedBackend::with_responses([
            draft_json("src/calc.c", 2),
            draft_json("src/calc.c", 2),
            review_json("src/calc.c", 2),
            review_json("CALC.C", 2),
        ]));
        let result = pipeline(&backend, PipelineOptions::default())
            .run("m", &files(), "p", Some("German"))
            .await
            .unwrap();

        assert_eq!(result.issues[0].file, "src/calc.c");
        let calls = backend.invocations();
        assert_eq!(calls.len(), 4);
        let translate = &calls[3];
        assert_eq!(translate.stage, "translate");
        assert_eq!(translate.messages.len(), 2);
        assert!(translate.messages[0].content.contains("German"));
        assert!(translate.messages[1].content.starts_with("Final verified review to translate:\n"));
        assert_eq!(
            translate.metadata[METADATA_RESPONSE_FORMAT]["json_schema"]["name"],
            "ReviewResult"
        );
    }

    #[tokio::test]
    async fn test_empty_stage_content_aborts_run() {
        let backend = Arc::new(ScriptedBackend::with_responses([draft_json("src/calc.c", 2), String::new()]));
        let err = pipeline(&backend, PipelineOptions::default())
            .run("m", &files(), "p", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Stage(StageError::EmptyResponse {
                stage: StageId::Critique
            })
        ));
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_no_source_files_skips_backend() {
        let backend = Arc::new(ScriptedBackend::new());
        let only_docs = HashMap::from([("notes.txt".to_string(), "x".to_string())]);
        let err = pipeline(&backend, PipelineOptions::default())
            .run("m", &only_docs, "p", None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoSourceFiles { skipped: 1 }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stage_overrides_apply() {
        let backend = Arc::new(ScriptedBackend::with_responses([
            draft_json("src/calc.c", 2),
            review_json("src/calc.c", 2),
        ]));
        let mut options = PipelineOptions::default()
            .with_critique(false)
            .with_stage_timeout(Duration::from_secs(42));
        options.review.model = Some("big-model".to_string());
        options.draft.temperature = 0.9;

        pipeline(&backend, options).run("small-model", &files(), "p", None).await.unwrap();

        let calls = backend.invocations();
        assert_eq!(calls[0].model, "small-model");
        assert_eq!(calls[0].temperature(), Some(0.9));
        assert_eq!(calls[0].timeout, Duration::from_secs(42));
        assert_eq!(calls[1].model, "big-model");
    }

    #[test]
    fn test_options_from_config() {
        let config = Config::builder()
            .critique_enabled(false)
            .stage_timeout(Duration::from_secs(120))
            .stage_model(StageId::Review, "reviewer")
            .stage_temperature(StageId::Draft, 0.5)
            .build()
            .unwrap();

        let options = PipelineOptions::from_config(&config);
        assert!(!options.critique_enabled);
        assert_eq!(options.draft.temperature, 0.5);
        assert_eq!(options.critique.temperature, CRITIQUE_TEMPERATURE);
        assert_eq!(options.review.model.as_deref(), Some("reviewer"));
        assert_eq!(options.draft.model, None);
        assert_eq!(options.translate.timeout, Duration::from_secs(120));
    }
}
