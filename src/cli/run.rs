//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Initialises logging and the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands::{self, ReviewCommand};

use codecritic_config::{CliArgs, Config};
use codecritic_utils::error::{ConfigError, CriticError};
use codecritic_utils::exit_codes::ExitCode;
use codecritic_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Prints everything, including errors. On failure returns the exit code
/// for `main` to pass to `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let cli_args = build_cli_args(&cli);

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report(&config_error(err))),
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("Warning: failed to initialise logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Review {
                source_dir,
                prompt,
                format,
                output,
                ..
            } => {
                let command = ReviewCommand {
                    source_dir,
                    prompt,
                    format,
                    output,
                };
                commands::execute_review_command(&command, &config).await
            }
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    result.map_err(|error| report(&error))
}

/// Fold the parsed command line into configuration overrides.
pub(crate) fn build_cli_args(cli: &Cli) -> CliArgs {
    let mut cli_args = CliArgs {
        config_path: cli.config.clone(),
        verbose: cli.verbose.then_some(true),
        llm_provider: cli.llm_provider.clone(),
        ..CliArgs::default()
    };

    if let Commands::Review {
        model,
        language,
        no_critique,
        stage_timeout,
        ..
    } = &cli.command
    {
        cli_args.model = model.clone();
        cli_args.language = language.clone();
        cli_args.no_critique = *no_critique;
        cli_args.stage_timeout = *stage_timeout;
    }
    cli_args
}

/// Discovery reports through `anyhow`; recover the typed error when there is one.
fn config_error(err: anyhow::Error) -> CriticError {
    match err.downcast::<ConfigError>() {
        Ok(config_err) => CriticError::Config(config_err),
        Err(other) => CriticError::Config(ConfigError::InvalidFile(format!("{other:#}"))),
    }
}

fn report(error: &CriticError) -> ExitCode {
    eprintln!("{}", error.display_for_user());
    error.to_exit_code()
}
