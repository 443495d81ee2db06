//! Command implementations
//!
//! `review` loads the tree and prompt, runs the pipeline and renders the
//! result; `config` prints the effective configuration.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use codecritic_config::Config;
use codecritic_engine::{ReviewPipeline, ReviewResult};
use codecritic_utils::error::CriticError;

use super::args::OutputFormat;
use crate::source::{load_prompt, load_source_tree};

/// Parameters of `codecritic review` that are not configuration
#[derive(Debug, Clone)]
pub(crate) struct ReviewCommand {
    pub source_dir: PathBuf,
    pub prompt: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub(crate) async fn execute_review_command(
    command: &ReviewCommand,
    config: &Config,
) -> Result<(), CriticError> {
    let files = load_source_tree(&command.source_dir)?;
    let draft_prompt = load_prompt(&command.prompt)?;
    let pipeline = ReviewPipeline::from_config(config)?;

    let model = config.default_model();
    tracing::info!(
        source_dir = %command.source_dir.display(),
        files = files.len(),
        model = %model,
        critique = config.critique_enabled(),
        language = config.language().unwrap_or("-"),
        "Starting review"
    );

    let result = pipeline
        .run(&model, &files, &draft_prompt, config.language())
        .await?;

    let rendered = render(&result, command.format)?;
    write_output(command.output.as_deref(), &rendered)
}

/// Render the final review in the requested format.
pub(crate) fn render(result: &ReviewResult, format: OutputFormat) -> Result<String, CriticError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map_err(|err| CriticError::Io(io::Error::other(err))),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &ReviewResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Summary:\n{}\n", result.summary.trim());
    if result.issues.is_empty() {
        out.push_str("No issues found.");
        return out;
    }

    let _ = writeln!(out, "Issues ({}):", result.issues.len());
    for issue in &result.issues {
        let _ = writeln!(
            out,
            "  [{}] {}:{}\n      {}",
            issue.severity, issue.file, issue.line, issue.explanation
        );
    }
    out.truncate(out.trim_end().len());
    out
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<(), CriticError> {
    match path {
        Some(path) => {
            fs::write(path, format!("{rendered}\n"))?;
            tracing::info!(path = %path.display(), "Wrote review");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub(crate) fn execute_config_command(config: &Config) -> Result<(), CriticError> {
    println!("Effective configuration:");
    for (key, (value, source)) in config.effective_config() {
        println!("  {key} = {value}  ({source})");
    }
    Ok(())
}
