//! Output handler port for captured process output.
//!
//! Each supervised process has two pipe readers running on their own tasks.
//! They call into this port once per line, from whatever task owns the pipe.

use std::fmt;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives captured output lines from a supervised process.
///
/// Implementations must not block: they are called from pipe reader tasks
/// and a slow handler stalls the child process once its pipe fills.
pub trait OutputHandler: Send + Sync {
    /// Called once per line written to stdout (without trailing newline).
    fn on_stdout(&self, line: String);

    /// Called once per line written to stderr (without trailing newline).
    fn on_stderr(&self, line: String);

    /// Dispatch by stream type.
    fn on_line(&self, stream: OutputStream, line: String) {
        match stream {
            OutputStream::Stdout => self.on_stdout(line),
            OutputStream::Stderr => self.on_stderr(line),
        }
    }
}
