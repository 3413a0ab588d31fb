//! Filesystem locations used by relayctl.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data_root>/
//!   mediamtx.yml   generated relay config
//!   slots.txt      persisted slot list
//!   log.txt        operator log
//!   relay.pid      PID of the relay we launched
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "RELAYCTL_DATA_DIR";

const APP_DIR_NAME: &str = "relayctl";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// A path was expected to be a directory but was not.
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}

/// Default data directory (`<data_local_dir>/relayctl`).
pub fn data_root() -> Result<PathBuf, PathError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(PathError::NoDataDir)
}

/// Resolved file locations for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use `override_dir` when given, otherwise the platform default.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self, PathError> {
        match override_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => data_root().map(Self::new),
        }
    }

    /// Create the data directory if needed.
    pub fn ensure(&self) -> Result<(), PathError> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(PathError::NotADirectory(self.root.clone()));
        }
        std::fs::create_dir_all(&self.root).map_err(|e| PathError::CreateFailed {
            path: self.root.clone(),
            reason: e.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relay_config(&self) -> PathBuf {
        self.root.join("mediamtx.yml")
    }

    pub fn slot_list(&self) -> PathBuf {
        self.root.join("slots.txt")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("log.txt")
    }

    pub fn relay_pidfile(&self) -> PathBuf {
        self.root.join("relay.pid")
    }
}
