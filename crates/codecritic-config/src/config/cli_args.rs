use std::path::PathBuf;

/// CLI overrides fed into configuration discovery.
///
/// Every `None` leaves the lower-precedence value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file; disables upward discovery.
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub stage_timeout: Option<u64>,
    pub verbose: Option<bool>,
    pub language: Option<String>,
    /// `--no-critique`
    pub no_critique: bool,
    pub llm_provider: Option<String>,
}
