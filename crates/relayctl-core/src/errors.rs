//! Error taxonomy for stream supervision.
//!
//! Errors that leave state needing operator attention (spawn failures,
//! config writes, bad slot indices) are surfaced to callers. Best-effort
//! failures (termination timeouts, log file writes) are absorbed where they
//! happen and never appear here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// An external process could not be launched.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The executable does not exist (or is not on `PATH`).
    #[error("executable not found: {program}")]
    NotFound { program: PathBuf },

    /// The OS refused to execute the binary.
    #[error("permission denied launching {program}")]
    PermissionDenied { program: PathBuf },

    /// Any other fork/exec failure.
    #[error("failed to launch {program}: {source}")]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    /// Classify an `io::Error` returned by a spawn attempt.
    pub fn from_io(program: impl Into<PathBuf>, err: io::Error) -> Self {
        let program = program.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { program },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Io {
                program,
                source: err,
            },
        }
    }

    pub fn program(&self) -> &PathBuf {
        match self {
            Self::NotFound { program }
            | Self::PermissionDenied { program }
            | Self::Io { program, .. } => program,
        }
    }
}

/// Operation addressed a slot that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("slot index {index} out of range (have {len} slots)")]
pub struct SlotIndexError {
    pub index: usize,
    pub len: usize,
}

/// The relay configuration file could not be written.
#[derive(Debug, Error)]
#[error("failed to write relay config {path}: {source}")]
pub struct ConfigWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Failures bringing the relay server up.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to render relay config: {0}")]
    ConfigRender(#[from] serde_yaml::Error),

    #[error(transparent)]
    ConfigWrite(#[from] ConfigWriteError),

    #[error("relay server failed to start: {0}")]
    Spawn(#[source] SpawnError),

    /// Readiness poll gave up; the relay was stopped again.
    #[error("relay server did not accept connections on port {port} within {waited_ms} ms")]
    NotReady { port: u16, waited_ms: u64 },

    /// The relay process died before it became ready.
    #[error("relay server exited during startup (exit code {code:?})")]
    ExitedDuringStartup { code: Option<i32> },
}

/// Why a single stream failed to start.
#[derive(Debug, Error)]
pub enum StreamStartCause {
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// A stream could not be started. The slot is left stopped.
#[derive(Debug, Error)]
#[error("stream {} failed to start: {source}", .index + 1)]
pub struct StreamStartError {
    pub index: usize,
    #[source]
    pub source: StreamStartCause,
}

impl StreamStartError {
    pub fn spawn(index: usize, err: SpawnError) -> Self {
        Self {
            index,
            source: StreamStartCause::Spawn(err),
        }
    }

    pub fn relay(index: usize, err: RelayError) -> Self {
        Self {
            index,
            source: StreamStartCause::Relay(err),
        }
    }

    /// Whether the underlying cause is a worker spawn failure.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self.source, StreamStartCause::Spawn(_))
    }
}

/// A path could not be accepted as a media source.
#[derive(Debug, Error)]
pub enum MediaSourceError {
    #[error("path cannot be empty")]
    EmptyPath,

    #[error("media file not found: {0}")]
    NotFound(PathBuf),

    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),

    #[error("cannot resolve {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// The slot list is line-based UTF-8 text.
    #[error("unsupported file name (not UTF-8 or contains a line break): {}", .0.display())]
    UnsupportedName(PathBuf),
}

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Index(#[from] SlotIndexError),

    #[error(transparent)]
    StreamStart(#[from] StreamStartError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    MediaSource(#[from] MediaSourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_classification() {
        let not_found = SpawnError::from_io("ffmpeg", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(not_found, SpawnError::NotFound { .. }));

        let denied =
            SpawnError::from_io("ffmpeg", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, SpawnError::PermissionDenied { .. }));

        let other = SpawnError::from_io("ffmpeg", io::Error::other("fork failed"));
        assert!(matches!(other, SpawnError::Io { .. }));
        assert_eq!(other.program(), &PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_stream_start_error_uses_one_based_name() {
        let err = StreamStartError::spawn(
            2,
            SpawnError::NotFound {
                program: PathBuf::from("ffmpeg"),
            },
        );
        assert!(err.to_string().starts_with("stream 3 failed to start"));
        assert!(err.is_spawn_failure());
    }

    #[test]
    fn test_index_error_message() {
        let err = SlotIndexError { index: 5, len: 2 };
        assert_eq!(err.to_string(), "slot index 5 out of range (have 2 slots)");
    }
}
