//! Settings domain types and validation.
//!
//! This module contains the settings consumed by the supervisor. They are
//! pure domain types with no infrastructure dependencies; the CLI fills them
//! from flags and environment variables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SupervisionMode;

/// Default RTSP listen port of the relay server.
pub const DEFAULT_RTSP_PORT: u16 = 8554;

/// Default bind address for the relay's control API.
pub const DEFAULT_API_ADDRESS: &str = ":9997";

/// Default warm-up delay after launching the relay.
pub const DEFAULT_RELAY_WARMUP_MS: u64 = 2000;

/// Default grace period when stopping a process.
pub const DEFAULT_STOP_GRACE_MS: u64 = 3000;

/// Default log flush period.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 500;

/// Default number of lines retained by the log view.
pub const DEFAULT_MAX_LOG_LINES: usize = 500;

/// Output resolution for re-encoding (`scale=W:H`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render as an ffmpeg `scale` filter argument.
    pub fn scale_filter(self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = SettingsError;

    /// Accepts `1280x720`, `1280X720` or `1280:720`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettingsError::InvalidResolution(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(['x', 'X', ':'])
            .ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Supervisor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Relay server executable (MediaMTX-compatible).
    pub relay_binary: PathBuf,

    /// Transcoder executable (ffmpeg-compatible).
    pub transcoder_binary: PathBuf,

    /// How transcoders are launched.
    pub mode: SupervisionMode,

    /// Relay RTSP listen port; also used in stream URLs.
    pub rtsp_port: u16,

    /// Whether the relay control API is enabled.
    pub api_enabled: bool,

    /// Relay control API bind address.
    pub api_address: String,

    /// Relay log verbosity (`error`, `warn`, `info`, `debug`).
    pub relay_log_level: String,

    /// Optional output resolution; `None` keeps the source resolution.
    pub resolution: Option<Resolution>,

    /// Optional output frame rate; `None` keeps the source frame rate.
    pub fps: Option<u32>,

    /// Fixed delay after launching the relay before workers may connect.
    pub relay_warmup_ms: u64,

    /// Poll the RTSP port for readiness instead of sleeping a fixed delay.
    pub relay_probe: bool,

    /// Grace period for a stop to observe process exit.
    pub stop_grace_ms: u64,

    /// Log flush period.
    pub flush_interval_ms: u64,

    /// Lines retained by the log view.
    pub max_log_lines: usize,

    /// Forward every captured output line instead of the curated subset.
    pub verbose_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            relay_binary: PathBuf::from(default_binary("mediamtx")),
            transcoder_binary: PathBuf::from(default_binary("ffmpeg")),
            mode: SupervisionMode::PerSlot,
            rtsp_port: DEFAULT_RTSP_PORT,
            api_enabled: false,
            api_address: DEFAULT_API_ADDRESS.to_string(),
            relay_log_level: "info".to_string(),
            resolution: None,
            fps: None,
            relay_warmup_ms: DEFAULT_RELAY_WARMUP_MS,
            relay_probe: false,
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            verbose_output: false,
        }
    }

    /// True when the transcoder must re-encode rather than copy streams.
    pub const fn needs_reencode(&self) -> bool {
        self.resolution.is_some() || self.fps.is_some()
    }

    pub const fn relay_warmup(&self) -> Duration {
        Duration::from_millis(self.relay_warmup_ms)
    }

    pub const fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub const fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn default_binary(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Errors that can occur during settings validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid port: {0}. Port must be between 1024 and 65535.")]
    InvalidPort(u16),

    #[error("Invalid resolution '{0}'. Expected WIDTHxHEIGHT, e.g. 1280x720.")]
    InvalidResolution(String),

    #[error("Invalid frame rate: {0}. Must be between 1 and 240.")]
    InvalidFps(u32),

    #[error("Invalid log line limit: {0}. Must be between 500 and 8000.")]
    InvalidMaxLogLines(usize),

    #[error("Invalid flush interval: {0} ms. Must be between 50 and 5000.")]
    InvalidFlushInterval(u64),

    #[error("Invalid relay log level '{0}'.")]
    InvalidLogLevel(String),

    #[error("{0} binary path cannot be empty")]
    EmptyBinary(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.rtsp_port < 1024 {
        return Err(SettingsError::InvalidPort(settings.rtsp_port));
    }

    if let Some(fps) = settings.fps
        && !(1..=240).contains(&fps)
    {
        return Err(SettingsError::InvalidFps(fps));
    }

    if !(500..=8000).contains(&settings.max_log_lines) {
        return Err(SettingsError::InvalidMaxLogLines(settings.max_log_lines));
    }

    if !(50..=5000).contains(&settings.flush_interval_ms) {
        return Err(SettingsError::InvalidFlushInterval(
            settings.flush_interval_ms,
        ));
    }

    if !matches!(
        settings.relay_log_level.as_str(),
        "error" | "warn" | "info" | "debug"
    ) {
        return Err(SettingsError::InvalidLogLevel(
            settings.relay_log_level.clone(),
        ));
    }

    if settings.relay_binary.as_os_str().is_empty() {
        return Err(SettingsError::EmptyBinary("relay"));
    }

    if settings.transcoder_binary.as_os_str().is_empty() {
        return Err(SettingsError::EmptyBinary("transcoder"));
    }

    Ok(())
}
