//! CLI-specific error types and exit code mapping

use galago_smoke_core::error::{PreconditionError, SmokeError};
use galago_smoke_harness::HarnessError;
use galago_smoke_platform::PlatformError;

/// CLI-specific error type.
///
/// `exit_code()` maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Environment precondition not met; nothing was touched.
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The run finished but not every scenario passed.
    #[error("smoke run failed: {passed} passed, {failed} failed, {skipped} skipped")]
    RunFailed {
        passed: usize,
        failed: usize,
        skipped: usize,
    },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from galago-smoke-core.
    #[error("{0}")]
    Core(#[from] SmokeError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("{0}")]
    Harness(#[from] HarnessError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | Scenario failure / command error         |
    /// | 2    | Configuration or precondition failure    |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Precondition(_) => 2,
            Self::Io(_) => 10,
            Self::Core(e) | Self::Harness(HarnessError::Config(e)) => core_exit_code(e),
            Self::Command(_)
            | Self::RunFailed { .. }
            | Self::JsonSerialize(_)
            | Self::Platform(_)
            | Self::Harness(_) => 1,
        }
    }
}

fn core_exit_code(err: &SmokeError) -> i32 {
    match err {
        SmokeError::Config(_) | SmokeError::Precondition(_) | SmokeError::InvalidValue(_) => 2,
        SmokeError::Io(_) => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galago_smoke_core::error::ConfigError;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("bad".to_owned());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_precondition_error() {
        let err: CliError = PreconditionError::MissingEnv {
            name: "CF_HOME".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 2, "missing env should exit with 2");
        assert!(err.to_string().contains("CF_HOME"));
    }

    #[test]
    fn test_exit_code_run_failed() {
        let err = CliError::RunFailed {
            passed: 8,
            failed: 1,
            skipped: 1,
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "smoke run failed: 8 passed, 1 failed, 1 skipped"
        );
    }

    #[test]
    fn test_exit_code_io_error() {
        let err = CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_exit_code_follows_core_error_kind() {
        let config: CliError = SmokeError::Config(ConfigError::FileNotFound {
            path: "galago-smoke.toml".to_owned(),
        })
        .into();
        assert_eq!(config.exit_code(), 2);

        let io: CliError = SmokeError::Io(std::io::Error::other("disk")).into();
        assert_eq!(io.exit_code(), 10);

        let wrapped: CliError = HarnessError::Config(SmokeError::InvalidValue(
            "probability".to_owned(),
        ))
        .into();
        assert_eq!(wrapped.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_harness_error_is_command_failure() {
        let err: CliError = HarnessError::Cancelled.into();
        assert_eq!(err.exit_code(), 1);
    }
}
