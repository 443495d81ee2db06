//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// codecritic - adversarial multi-pass code review
#[derive(Parser, Debug)]
#[command(name = "codecritic")]
#[command(about = "Review a source tree with draft, critique and verification passes")]
#[command(long_about = r#"
codecritic reviews a source tree by driving a text-generation service through
several adversarial passes: a broad draft, a skeptical critique, a strict
verification and an optional translation. File names in the final result are
reconciled against the files that were actually reviewed.

EXAMPLES:
  # Review a project with a custom draft prompt
  codecritic review ./project --prompt prompts/draft.md

  # Skip the critique pass and write JSON to a file
  codecritic review ./project --prompt draft.md --no-critique --output review.json

  # Translate the final review
  codecritic review ./project --prompt draft.md --language Ukrainian --format text

  # Show the effective configuration and where each value came from
  codecritic config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > environment > config file > defaults
  Config file is discovered by searching upward from CWD for .codecritic/config.toml
  Use --config to specify an explicit config file path
  The API key is read from the variable named by llm.openai.api_key_env (default ANALYZER_API_KEY)

STAGES:
  Draft → Critique → Review → Translate (only with --language)
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM provider to use (openai)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Rendering of the final review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review every supported source file under a directory
    ///
    /// EXAMPLES:
    ///   codecritic review ./src --prompt draft.md
    ///   codecritic review . --prompt draft.md --model gpt-4o --stage-timeout 300
    Review {
        /// Directory containing the sources to review
        source_dir: PathBuf,

        /// File holding the draft-stage system prompt
        #[arg(long)]
        prompt: PathBuf,

        /// Model identifier for every stage without its own override
        #[arg(long)]
        model: Option<String>,

        /// Translate the final review into this language
        #[arg(long)]
        language: Option<String>,

        /// Skip the critique stage
        #[arg(long)]
        no_critique: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the result to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Per-stage timeout in seconds (default: 600, min: 5)
        #[arg(long)]
        stage_timeout: Option<u64>,
    },

    /// Show the effective configuration with the source of each value
    Config,
}

/// Build the clap command (for completions and tests).
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_review_flags() {
        let cli = Cli::try_parse_from([
            "codecritic",
            "review",
            "src",
            "--prompt",
            "p.md",
            "--model",
            "gpt-4o",
            "--language",
            "German",
            "--no-critique",
            "--format",
            "text",
            "--output",
            "out.txt",
            "--stage-timeout",
            "120",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Review {
                source_dir,
                prompt,
                model,
                language,
                no_critique,
                format,
                output,
                stage_timeout,
            } => {
                assert_eq!(source_dir, PathBuf::from("src"));
                assert_eq!(prompt, PathBuf::from("p.md"));
                assert_eq!(model.as_deref(), Some("gpt-4o"));
                assert_eq!(language.as_deref(), Some("German"));
                assert!(no_critique);
                assert_eq!(format, OutputFormat::Text);
                assert_eq!(output, Some(PathBuf::from("out.txt")));
                assert_eq!(stage_timeout, Some(120));
            }
            Commands::Config => panic!("expected review"),
        }
    }

    #[test]
    fn test_review_defaults() {
        let cli = Cli::try_parse_from(["codecritic", "review", ".", "--prompt", "p"]).unwrap();
        match cli.command {
            Commands::Review {
                format,
                no_critique,
                output,
                ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert!(!no_critique);
                assert!(output.is_none());
            }
            Commands::Config => panic!("expected review"),
        }
    }

    #[test]
    fn test_review_requires_prompt() {
        assert!(Cli::try_parse_from(["codecritic", "review", "."]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["codecritic", "config", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Config));
    }
}
