//! Core domain types and port definitions for relayctl.
//!
//! This crate holds everything that does not touch the operating system's
//! process table: media sources, stream naming, settings, the transcoder
//! command builder, relay configuration rendering and the persisted slot
//! list. Process supervision lives in `relayctl-runtime`.

pub mod command;
pub mod domain;
pub mod errors;
pub mod paths;
pub mod ports;
pub mod relay_config;
pub mod settings;
pub mod slot_list;
pub mod transcode;

// Re-export commonly used types for convenience
pub use command::{CommandSpec, quote_arg};
pub use domain::{MediaSource, SlotSnapshot, SupervisionMode, stream_name, stream_url};
pub use errors::{
    ConfigWriteError, MediaSourceError, OrchestratorError, RelayError, SlotIndexError, SpawnError,
    StreamStartCause, StreamStartError,
};
pub use ports::{LogDisplay, OutputHandler, OutputStream};
pub use relay_config::RelayConfigRenderer;
pub use settings::{
    DEFAULT_API_ADDRESS, DEFAULT_RTSP_PORT, Resolution, Settings, SettingsError,
    duration_ms, validate_settings,
};
pub use slot_list::SlotListStore;
pub use transcode::{TranscodeCommandBuilder, TranscodeProfile};

pub use paths::{AppPaths, PathError, data_root};
