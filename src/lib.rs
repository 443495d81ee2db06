//! codecritic - adversarial multi-pass code review
//!
//! Reviews a set of source files by driving a text-generation service
//! through a draft pass, a skeptical critique, a strict verification and an
//! optional translation, then repairs file names in the result so every issue
//! points at a file that was actually reviewed.
//!
//! codecritic can be used in two ways:
//! - **CLI**: `codecritic review <SOURCE_DIR> --prompt <FILE>`
//! - **Library**: build a [`ReviewPipeline`] over any [`LlmBackend`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use codecritic::{Config, ReviewPipeline};
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().model("gpt-4o-mini").build()?;
//! let pipeline = ReviewPipeline::from_config(&config)?;
//!
//! let files = HashMap::from([(
//!     "src/calc.c".to_string(),
//!     "int div(int a, int b) { return a / b; }".to_string(),
//! )]);
//! let review = pipeline
//!     .run("gpt-4o-mini", &files, "You are a meticulous C reviewer.", None)
//!     .await?;
//!
//! for issue in &review.issues {
//!     println!("{}:{} [{}] {}", issue.file, issue.line, issue.severity, issue.explanation);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Crate layout
//!
//! - `codecritic-utils`: errors, exit codes, logging, redaction
//! - `codecritic-config`: configuration discovery and precedence
//! - `codecritic-llm`: the [`LlmBackend`] trait and the OpenAI-compatible backend
//! - `codecritic-engine`: embedding, stages, orchestration, reconciliation

pub mod cli;
pub mod source;

pub use codecritic_config::{CliArgs, Config, ConfigBuilder};
pub use codecritic_engine::{
    CandidateIssue, CandidateSeverity, Confidence, DraftResult, EmbeddedFile, FilenameReconciler,
    Language, PipelineOptions, Resolution, ReviewIssue, ReviewPipeline, ReviewResult, Severity,
    embed_files, enumerate_lines, reconcile_filename,
};
pub use codecritic_llm::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
pub use codecritic_utils::{
    ConfigError, CriticError, ExitCode, LlmError, PipelineError, SourceError, StageError, StageId,
    UserFriendlyError,
};
pub use source::{load_prompt, load_source_tree};
