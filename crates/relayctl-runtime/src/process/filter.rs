//! Routing captured process output into the operator log.

use relayctl_core::{OutputHandler, OutputStream};
use tracing::trace;

use crate::log::LogSink;

const TRANSCODER_STDOUT_MARKERS: &[&str] = &["Input #", "Stream #", "Output #", "Stream mapping"];
const TRANSCODER_STDERR_NOISE: &[&str] = &["libav", "built with", "configuration:"];
const RELAY_STDOUT_MARKERS: &[&str] = &["listener opened", "session", "ERROR", "WARN"];

/// Which captured lines are worth showing to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFilter {
    /// Stream info and progress on stdout; stderr minus the build banner.
    Transcoder,
    /// Listener/session lines and warnings on stdout; all of stderr.
    Relay,
    /// Everything.
    PassThrough,
}

impl OutputFilter {
    /// Whether `line` from `stream` should reach the operator log.
    pub fn keep(self, stream: OutputStream, line: &str) -> bool {
        match (self, stream) {
            (Self::PassThrough, _) | (Self::Relay, OutputStream::Stderr) => true,
            (Self::Transcoder, OutputStream::Stdout) => {
                contains_any(line, TRANSCODER_STDOUT_MARKERS)
                    || (line.contains("frame=") && line.contains("fps="))
            }
            (Self::Transcoder, OutputStream::Stderr) => {
                !contains_any(line, TRANSCODER_STDERR_NOISE)
            }
            (Self::Relay, OutputStream::Stdout) => contains_any(line, RELAY_STDOUT_MARKERS),
        }
    }

    /// Render a kept line for the operator log.
    pub fn format(self, prefix: &str, stream: OutputStream, line: &str) -> String {
        match (self, stream) {
            (Self::Relay, OutputStream::Stderr) => format!("{prefix} ERROR: {line}"),
            _ => format!("{prefix}: {line}"),
        }
    }
}

fn contains_any(line: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| line.contains(n))
}

/// [`OutputHandler`] that filters lines and appends the survivors to a
/// [`LogSink`].
///
/// Runs on the pipe reader tasks; never touches orchestrator state.
#[derive(Debug, Clone)]
pub struct SinkOutputHandler {
    sink: LogSink,
    prefix: String,
    filter: OutputFilter,
}

impl SinkOutputHandler {
    pub fn new(sink: LogSink, prefix: impl Into<String>, filter: OutputFilter) -> Self {
        Self {
            sink,
            prefix: prefix.into(),
            filter,
        }
    }

    fn handle(&self, stream: OutputStream, line: &str) {
        trace!(source = %self.prefix, %stream, "{line}");
        if self.filter.keep(stream, line) {
            self.sink.append(self.filter.format(&self.prefix, stream, line));
        }
    }
}

impl OutputHandler for SinkOutputHandler {
    fn on_stdout(&self, line: String) {
        self.handle(OutputStream::Stdout, &line);
    }

    fn on_stderr(&self, line: String) {
        self.handle(OutputStream::Stderr, &line);
    }
}
