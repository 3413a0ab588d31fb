//! Transcoder command builder.
//!
//! Builds the ffmpeg-compatible invocation that reads one source file in
//! real time, loops it forever and publishes it into the relay under the
//! slot's stream name.

use std::path::PathBuf;

use crate::command::CommandSpec;
use crate::domain::{MediaSource, stream_name};
use crate::settings::{Resolution, Settings};

/// Encoding choices shared by every stream of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeProfile {
    pub resolution: Option<Resolution>,
    pub fps: Option<u32>,
    pub rtsp_port: u16,
}

impl TranscodeProfile {
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            resolution: settings.resolution,
            fps: settings.fps,
            rtsp_port: settings.rtsp_port,
        }
    }

    /// Video filter chain, or `None` for passthrough.
    pub fn video_filters(&self) -> Option<String> {
        let mut filters = Vec::new();
        if let Some(resolution) = self.resolution {
            filters.push(resolution.scale_filter());
        }
        if let Some(fps) = self.fps {
            filters.push(format!("fps={fps}"));
        }
        (!filters.is_empty()).then(|| filters.join(","))
    }
}

/// Builder for one slot's transcoder command.
///
/// # Example
///
/// ```rust,ignore
/// let cmd = TranscodeCommandBuilder::new("ffmpeg", &source, 0)
///     .profile(TranscodeProfile::from_settings(&settings))
///     .build();
/// ```
pub struct TranscodeCommandBuilder {
    binary_path: PathBuf,
    source: MediaSource,
    index: usize,
    profile: TranscodeProfile,
}

impl TranscodeCommandBuilder {
    pub fn new(binary_path: impl Into<PathBuf>, source: &MediaSource, index: usize) -> Self {
        Self {
            binary_path: binary_path.into(),
            source: source.clone(),
            index,
            profile: TranscodeProfile {
                resolution: None,
                fps: None,
                rtsp_port: crate::settings::DEFAULT_RTSP_PORT,
            },
        }
    }

    #[must_use]
    pub const fn profile(mut self, profile: TranscodeProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Publish target for this slot.
    pub fn output_url(&self) -> String {
        format!(
            "rtsp://localhost:{}/{}",
            self.profile.rtsp_port,
            stream_name(self.index)
        )
    }

    /// Build the final command.
    ///
    /// Order: pacing and looping, input, timestamp fix-up, then either a
    /// filter chain with explicit encoder limits or stream copy, then the
    /// RTSP output.
    pub fn build(self) -> CommandSpec {
        let output_url = self.output_url();
        let mut cmd = CommandSpec::new(&self.binary_path)
            .arg("-re")
            .arg_with_value("-stream_loop", "-1")
            .arg_with_value("-i", self.source.path().to_string_lossy())
            .arg_with_value("-avoid_negative_ts", "make_zero");

        match self.profile.video_filters() {
            Some(filters) => {
                cmd = cmd.arg_with_value("-vf", filters).args([
                    "-c:v", "libx264", "-preset", "fast", "-crf", "23", "-maxrate", "2000k",
                    "-bufsize", "4000k", "-c:a", "aac", "-b:a", "128k", "-ar", "44100",
                ]);
            }
            None => {
                cmd = cmd.arg_with_value("-c", "copy");
            }
        }

        cmd.arg_with_value("-f", "rtsp").arg(output_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str) -> MediaSource {
        MediaSource::from_trusted(PathBuf::from(path))
    }

    #[test]
    fn test_passthrough_uses_copy() {
        let cmd = TranscodeCommandBuilder::new("ffmpeg", &source("/media/a.mp4"), 0).build();
        let args = cmd.get_args();
        assert_eq!(
            args,
            &[
                "-re",
                "-stream_loop",
                "-1",
                "-i",
                "/media/a.mp4",
                "-avoid_negative_ts",
                "make_zero",
                "-c",
                "copy",
                "-f",
                "rtsp",
                "rtsp://localhost:8554/stream1",
            ]
        );
        assert!(!args.iter().any(|a| a == "-vf"));
    }

    #[test]
    fn test_resolution_only_emits_scale() {
        let profile = TranscodeProfile {
            resolution: Some(Resolution::new(1280, 720)),
            fps: None,
            rtsp_port: 8554,
        };
        let cmd = TranscodeCommandBuilder::new("ffmpeg", &source("/media/a.mp4"), 1)
            .profile(profile)
            .build();
        let args = cmd.get_args();
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "scale=1280:720");
        assert!(args.iter().any(|a| a == "libx264"));
        assert!(args.iter().any(|a| a == "2000k"));
        assert!(!args.iter().any(|a| a == "copy"));
        assert_eq!(args.last().unwrap(), "rtsp://localhost:8554/stream2");
    }

    #[test]
    fn test_both_filters_joined() {
        let profile = TranscodeProfile {
            resolution: Some(Resolution::new(640, 360)),
            fps: Some(25),
            rtsp_port: 9554,
        };
        assert_eq!(profile.video_filters().unwrap(), "scale=640:360,fps=25");
    }

    #[test]
    fn test_command_line_quotes_source_path() {
        let cmd = TranscodeCommandBuilder::new("ffmpeg", &source("/media/my clip.mp4"), 0).build();
        assert!(cmd.to_command_line().contains("-i \"/media/my clip.mp4\""));
    }
}
