//! Relay server configuration rendering.
//!
//! Produces the MediaMTX YAML document written before every relay start or
//! restart. The document is modelled as serde structs; `paths` is a
//! `BTreeMap`, so identical input always yields byte-identical text.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::{MediaSource, SupervisionMode, stream_name};
use crate::settings::Settings;
use crate::transcode::{TranscodeCommandBuilder, TranscodeProfile};

/// Catch-all path accepting any publisher.
const CATCH_ALL_PATH: &str = "all";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayConfig<'a> {
    log_level: &'a str,
    log_destinations: [&'static str; 1],
    api: bool,
    api_address: &'a str,
    rtsp: bool,
    rtsp_address: String,
    paths: BTreeMap<String, PathConf>,
}

/// One `paths` entry: either a publisher path or a relay-launched command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PathConf {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_on_init: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_on_init_restart: Option<bool>,
}

impl PathConf {
    const fn publisher() -> Self {
        Self {
            source: Some("publisher"),
            run_on_init: None,
            run_on_init_restart: None,
        }
    }

    const fn run_on_init(command: String) -> Self {
        Self {
            source: None,
            run_on_init: Some(command),
            run_on_init_restart: Some(true),
        }
    }
}

/// Renders relay configuration for one deployment.
#[derive(Debug, Clone)]
pub struct RelayConfigRenderer {
    mode: SupervisionMode,
    log_level: String,
    api_enabled: bool,
    api_address: String,
    rtsp_port: u16,
    transcoder_binary: PathBuf,
    profile: TranscodeProfile,
}

impl RelayConfigRenderer {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mode: settings.mode,
            log_level: settings.relay_log_level.clone(),
            api_enabled: settings.api_enabled,
            api_address: settings.api_address.clone(),
            rtsp_port: settings.rtsp_port,
            transcoder_binary: settings.transcoder_binary.clone(),
            profile: TranscodeProfile::from_settings(settings),
        }
    }

    pub const fn mode(&self) -> SupervisionMode {
        self.mode
    }

    /// Render the configuration document.
    ///
    /// `active` lists `(slot index, source)` pairs. Per-slot mode ignores it
    /// and declares a catch-all publisher path; declarative mode emits one
    /// `runOnInit` path per entry, named after the slot index.
    pub fn render(&self, active: &[(usize, MediaSource)]) -> Result<String, serde_yaml::Error> {
        let mut paths = BTreeMap::new();
        if self.mode == SupervisionMode::Declarative {
            for (index, source) in active {
                let command = TranscodeCommandBuilder::new(&self.transcoder_binary, source, *index)
                    .profile(self.profile)
                    .build();
                paths.insert(
                    stream_name(*index),
                    PathConf::run_on_init(command.to_command_line()),
                );
            }
        }
        if paths.is_empty() {
            paths.insert(CATCH_ALL_PATH.to_string(), PathConf::publisher());
        }

        serde_yaml::to_string(&RelayConfig {
            log_level: &self.log_level,
            log_destinations: ["stdout"],
            api: self.api_enabled,
            api_address: &self.api_address,
            rtsp: true,
            rtsp_address: format!(":{}", self.rtsp_port),
            paths,
        })
    }
}
