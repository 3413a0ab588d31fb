//! Relay and transcoder options.
//!
//! Every option has a `RELAYCTL_*` environment fallback (a `.env` file in
//! the working directory is loaded first) and defaults matching
//! [`Settings::with_defaults`].

use std::path::PathBuf;

use clap::Args;
use relayctl_core::settings::{
    DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_MAX_LOG_LINES, DEFAULT_RELAY_WARMUP_MS,
    DEFAULT_STOP_GRACE_MS,
};
use relayctl_core::{
    DEFAULT_API_ADDRESS, DEFAULT_RTSP_PORT, Resolution, Settings, SettingsError, SupervisionMode,
    validate_settings,
};

#[derive(Debug, Clone, Args)]
pub struct RelayOptions {
    /// Relay server executable
    #[arg(long, global = true, env = "RELAYCTL_RELAY_BIN")]
    pub relay_bin: Option<PathBuf>,

    /// Transcoder executable
    #[arg(long, global = true, env = "RELAYCTL_TRANSCODER_BIN")]
    pub transcoder_bin: Option<PathBuf>,

    /// Who launches transcoders: `per-slot` (relayctl) or `declarative` (the relay)
    #[arg(long, global = true, env = "RELAYCTL_MODE", default_value_t = SupervisionMode::PerSlot)]
    pub mode: SupervisionMode,

    /// RTSP listen port
    #[arg(long, global = true, env = "RELAYCTL_RTSP_PORT", default_value_t = DEFAULT_RTSP_PORT)]
    pub rtsp_port: u16,

    /// Enable the relay's control API
    #[arg(long, global = true, env = "RELAYCTL_API")]
    pub api: bool,

    /// Control API listen address
    #[arg(long, global = true, env = "RELAYCTL_API_ADDRESS", default_value = DEFAULT_API_ADDRESS)]
    pub api_address: String,

    /// Relay log level (error, warn, info, debug)
    #[arg(long, global = true, env = "RELAYCTL_RELAY_LOG_LEVEL", default_value = "info")]
    pub relay_log_level: String,

    /// Output resolution, e.g. 1280x720 (forces re-encoding)
    #[arg(long, global = true, env = "RELAYCTL_RESOLUTION")]
    pub resolution: Option<String>,

    /// Output frame rate (forces re-encoding)
    #[arg(long, global = true, env = "RELAYCTL_FPS")]
    pub fps: Option<u32>,

    /// Fixed relay warm-up before workers start, in milliseconds
    #[arg(long, global = true, env = "RELAYCTL_RELAY_WARMUP_MS", default_value_t = DEFAULT_RELAY_WARMUP_MS)]
    pub relay_warmup_ms: u64,

    /// Poll the RTSP port for readiness instead of a fixed warm-up
    #[arg(long, global = true, env = "RELAYCTL_RELAY_PROBE")]
    pub relay_probe: bool,

    /// How long a stop waits for a process to exit, in milliseconds
    #[arg(long, global = true, env = "RELAYCTL_STOP_GRACE_MS", default_value_t = DEFAULT_STOP_GRACE_MS)]
    pub stop_grace_ms: u64,

    /// Log flush period, in milliseconds
    #[arg(long, global = true, env = "RELAYCTL_FLUSH_INTERVAL_MS", default_value_t = DEFAULT_FLUSH_INTERVAL_MS)]
    pub flush_interval_ms: u64,

    /// Log lines kept for the `log` session command (500-8000)
    #[arg(long, global = true, env = "RELAYCTL_MAX_LOG_LINES", default_value_t = DEFAULT_MAX_LOG_LINES)]
    pub max_log_lines: usize,

    /// Show every line of relay/transcoder output
    #[arg(long, global = true, env = "RELAYCTL_VERBOSE_OUTPUT")]
    pub verbose_output: bool,
}

impl RelayOptions {
    /// Build and validate settings from the parsed options.
    pub fn to_settings(&self) -> Result<Settings, SettingsError> {
        let defaults = Settings::with_defaults();
        let resolution = self
            .resolution
            .as_deref()
            .map(str::parse::<Resolution>)
            .transpose()?;

        let settings = Settings {
            relay_binary: self.relay_bin.clone().unwrap_or(defaults.relay_binary),
            transcoder_binary: self
                .transcoder_bin
                .clone()
                .unwrap_or(defaults.transcoder_binary),
            mode: self.mode,
            rtsp_port: self.rtsp_port,
            api_enabled: self.api,
            api_address: self.api_address.clone(),
            relay_log_level: self.relay_log_level.clone(),
            resolution,
            fps: self.fps,
            relay_warmup_ms: self.relay_warmup_ms,
            relay_probe: self.relay_probe,
            stop_grace_ms: self.stop_grace_ms,
            flush_interval_ms: self.flush_interval_ms,
            max_log_lines: self.max_log_lines,
            verbose_output: self.verbose_output,
        };
        validate_settings(&settings)?;
        Ok(settings)
    }
}
