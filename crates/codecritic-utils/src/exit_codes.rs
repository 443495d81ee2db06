//! Exit code constants for codecritic.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Review completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 10 | `STAGE_TIMEOUT` | A stage exceeded its timeout |
//! | 65 | `STAGE_OUTPUT_INVALID` | A stage returned empty, malformed or schema-invalid output |
//! | 66 | `NO_INPUT` | Source tree, prompt, or embeddable files missing |
//! | 70 | `GENERATION_FAILURE` | The generation service call failed |

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the public CLI contract.
///
/// ```rust
/// use codecritic_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(66), ExitCode::NO_INPUT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - review completed and output written
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration values
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Stage timeout - a stage exceeded its configured timeout
    pub const STAGE_TIMEOUT: ExitCode = ExitCode(10);

    /// Stage output invalid - empty, malformed, or schema-mismatched stage output
    pub const STAGE_OUTPUT_INVALID: ExitCode = ExitCode(65);

    /// No input - source directory, prompt file, or embeddable files missing
    pub const NO_INPUT: ExitCode = ExitCode(66);

    /// Generation failure - the generation service call failed
    pub const GENERATION_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::STAGE_TIMEOUT.as_i32(), 10);
        assert_eq!(ExitCode::STAGE_OUTPUT_INVALID.as_i32(), 65);
        assert_eq!(ExitCode::NO_INPUT.as_i32(), 66);
        assert_eq!(ExitCode::GENERATION_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_exit_code_conversions() {
        let code: ExitCode = 70.into();
        assert_eq!(code, ExitCode::GENERATION_FAILURE);

        let raw: i32 = ExitCode::NO_INPUT.into();
        assert_eq!(raw, 66);
    }
}
