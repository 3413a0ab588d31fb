//! Stream naming, URLs and slot snapshots.
//!
//! Slots are identified by list position. The externally visible name is
//! 1-based (`stream1` for index 0), so removing a slot renames every slot
//! after it. Operators must re-copy URLs after a mid-list deletion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MediaSource;

/// Externally visible stream name for a 0-based slot index.
pub fn stream_name(index: usize) -> String {
    format!("stream{}", index + 1)
}

/// Viewer URL for a 0-based slot index.
pub fn stream_url(rtsp_port: u16, index: usize) -> String {
    format!("rtsp://localhost:{}/{}", rtsp_port, stream_name(index))
}

/// How transcoders are launched. Fixed for the lifetime of a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupervisionMode {
    /// relayctl spawns and owns one transcoder per active slot.
    #[default]
    PerSlot,
    /// The relay config embeds the transcoder command per path and the
    /// relay spawns (and restarts) the transcoders itself.
    Declarative,
}

impl fmt::Display for SupervisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerSlot => write!(f, "per-slot"),
            Self::Declarative => write!(f, "declarative"),
        }
    }
}

impl FromStr for SupervisionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-slot" | "perslot" | "slot" => Ok(Self::PerSlot),
            "declarative" | "relay" => Ok(Self::Declarative),
            other => Err(format!(
                "unknown supervision mode '{other}' (expected 'per-slot' or 'declarative')"
            )),
        }
    }
}

/// Read-only view of one slot, handed to front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSnapshot {
    pub index: usize,
    pub name: String,
    pub source: MediaSource,
    pub running: bool,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl SlotSnapshot {
    pub fn new(
        index: usize,
        source: MediaSource,
        running: bool,
        rtsp_port: u16,
        pid: Option<u32>,
    ) -> Self {
        Self {
            index,
            name: stream_name(index),
            source,
            running,
            url: stream_url(rtsp_port, index),
            pid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_stream_name_is_one_based() {
        assert_eq!(stream_name(0), "stream1");
        assert_eq!(stream_name(9), "stream10");
    }

    #[test]
    fn test_stream_url() {
        assert_eq!(stream_url(8554, 2), "rtsp://localhost:8554/stream3");
    }

    #[test]
    fn test_mode_parse_roundtrip() {
        for mode in [SupervisionMode::PerSlot, SupervisionMode::Declarative] {
            assert_eq!(mode.to_string().parse::<SupervisionMode>().unwrap(), mode);
        }
        assert!("sideways".parse::<SupervisionMode>().is_err());
    }

    #[test]
    fn test_snapshot_serialization() {
        let snap = SlotSnapshot::new(
            0,
            MediaSource::from_trusted(PathBuf::from("/media/a.mp4")),
            true,
            8554,
            Some(4242),
        );
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"name\":\"stream1\""));
        assert!(json.contains("\"url\":\"rtsp://localhost:8554/stream1\""));
        assert!(json.contains("\"pid\":4242"));
    }
}
