//! CLI-specific error types and mappings.
//!
//! Maps core and runtime errors onto exit codes and user-facing messages.

use relayctl_core::{OrchestratorError, PathError, SettingsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Bad slot number, unusable media path and similar operator mistakes.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A transcoder could not be launched.
    #[error("Process error: {0}")]
    Process(String),

    /// The relay server could not be brought up.
    #[error("Relay unavailable: {0}")]
    Relay(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where a category fits:
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 69: Relay unavailable (`EX_UNAVAILABLE`)
    /// - 71: Process launch failure (`EX_OSERR`)
    /// - 74: IO error (`EX_IOERR`)
    /// - 78: Configuration error (`EX_CONFIG`)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,
            Self::Relay(_) => 69,
            Self::Process(_) => 71,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
        }
    }
}

impl From<OrchestratorError> for CliError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Index(_) | OrchestratorError::MediaSource(_) => {
                Self::Arguments(err.to_string())
            }
            OrchestratorError::StreamStart(ref start) if start.is_spawn_failure() => {
                Self::Process(err.to_string())
            }
            OrchestratorError::StreamStart(_) | OrchestratorError::Relay(_) => {
                Self::Relay(err.to_string())
            }
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayctl_core::{RelayError, SlotIndexError, SpawnError, StreamStartError};
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Core("x".into()).exit_code(), 1);
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Relay("x".into()).exit_code(), 69);
        assert_eq!(CliError::Process("x".into()).exit_code(), 71);
        assert_eq!(CliError::Io("x".into()).exit_code(), 74);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
    }

    #[test]
    fn test_bad_slot_number_is_argument_error() {
        let err: CliError = OrchestratorError::from(SlotIndexError { index: 4, len: 2 }).into();
        assert!(matches!(err, CliError::Arguments(_)));
    }

    #[test]
    fn test_start_failures_split_by_cause() {
        let spawn = StreamStartError::spawn(
            0,
            SpawnError::NotFound {
                program: PathBuf::from("ffmpeg"),
            },
        );
        let err: CliError = OrchestratorError::from(spawn).into();
        assert!(matches!(err, CliError::Process(_)));
        assert!(err.to_string().contains("stream 1"));

        let relay = StreamStartError::relay(
            1,
            RelayError::NotReady {
                port: 8554,
                waited_ms: 10_000,
            },
        );
        let err: CliError = OrchestratorError::from(relay).into();
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn test_settings_error_is_config() {
        let err: CliError = SettingsError::InvalidPort(22).into();
        assert_eq!(err.exit_code(), 78);
    }
}
