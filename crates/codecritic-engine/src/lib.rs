//! Adversarial review engine
//!
//! Embeds source files, drives the Draft → Critique → Review → Translate
//! stages against an [`LlmBackend`](codecritic_llm::LlmBackend), and reconciles
//! the file names in the final result.

pub mod embed;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod reconcile;
pub mod schema;
pub mod stage;

pub use embed::{Embedding, Language, embed_files, enumerate_lines, source_listing};
pub use model::{
    CandidateIssue, CandidateSeverity, Confidence, DraftResult, DraftStats, EmbeddedFile,
    EvidenceItem, Observation, ReviewIssue, ReviewResult, Severity, Validate,
};
pub use pipeline::{PipelineOptions, ReviewPipeline, StageOptions};
pub use reconcile::{FilenameReconciler, Resolution, reconcile_filename};
pub use stage::{StageExecutor, StageOutput, StageRequest, parse_stage_output};
