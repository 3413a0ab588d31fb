//! One supervised external process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use relayctl_core::{CommandSpec, OutputHandler, OutputStream, SpawnError, duration_ms};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::spawn_stream_reader;

/// `CREATE_NO_WINDOW`: keep console tools from flashing a window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// How long pipe readers get to drain after the process is gone.
const READER_DRAIN: Duration = Duration::from_millis(200);

/// Result of stopping a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process was killed and reaped within the grace period.
    Exited { code: Option<i32> },
    /// The process had already exited before the stop request.
    AlreadyExited { code: Option<i32> },
    /// The process was still not reaped when the grace period ran out.
    /// Resources were released anyway.
    TimedOut,
}

impl StopOutcome {
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// A spawned child with its stdout/stderr captured line by line.
///
/// Dropping a handle kills the child (`kill_on_drop`); use [`stop`] for a
/// bounded wait and a report of what happened.
///
/// [`stop`]: ProcessHandle::stop
pub struct ProcessHandle {
    label: String,
    program: PathBuf,
    pid: Option<u32>,
    started_at: DateTime<Local>,
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("label", &self.label)
            .field("program", &self.program)
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    /// Spawn `command` with piped output.
    ///
    /// Every stdout/stderr line is delivered to `output` from a reader task
    /// for the lifetime of the process. Must be called inside a tokio
    /// runtime.
    pub fn start(
        label: impl Into<String>,
        command: &CommandSpec,
        output: Arc<dyn OutputHandler>,
    ) -> Result<Self, SpawnError> {
        let label = label.into();
        let program = command.program().to_path_buf();

        let mut cmd = Command::new(&program);
        cmd.args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd
            .spawn()
            .map_err(|e| SpawnError::from_io(&program, e))?;
        let pid = child.id();

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_stream_reader(
                stdout,
                label.clone(),
                OutputStream::Stdout,
                Arc::clone(&output),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_stream_reader(
                stderr,
                label.clone(),
                OutputStream::Stderr,
                output,
            ));
        }

        debug!(process = %label, pid = ?pid, program = %program.display(), "Spawned process");

        Ok(Self {
            label,
            program,
            pid,
            started_at: Local::now(),
            child,
            readers,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub const fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Exit code if the process has exited, without blocking.
    ///
    /// Returns `Some(code)` once exited (`code` is `None` when killed by a
    /// signal) and `None` while still running. A failed status query counts
    /// as exited.
    pub fn try_exit(&mut self) -> Option<Option<i32>> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.code()),
            Ok(None) => None,
            Err(e) => {
                warn!(process = %self.label, error = %e, "Error checking process");
                Some(None)
            }
        }
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&mut self) -> bool {
        self.try_exit().is_none()
    }

    /// Forcefully terminate and wait up to `grace` for the exit.
    ///
    /// Never fails: an already-exited process is reported as such, and a
    /// process that outlives the grace period is abandoned with its pipes
    /// released.
    pub async fn stop(mut self, grace: Duration) -> StopOutcome {
        let outcome = if let Some(code) = self.try_exit() {
            StopOutcome::AlreadyExited { code }
        } else {
            if let Err(e) = self.child.start_kill() {
                // Lost a race with a natural exit
                debug!(process = %self.label, error = %e, "kill request failed");
            }

            match timeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => StopOutcome::Exited {
                    code: status.code(),
                },
                Ok(Err(e)) => {
                    warn!(process = %self.label, error = %e, "wait after kill failed");
                    StopOutcome::TimedOut
                }
                Err(_) => {
                    warn!(
                        process = %self.label,
                        pid = ?self.pid,
                        grace_ms = duration_ms(grace),
                        "Process did not exit within grace period, releasing handle"
                    );
                    StopOutcome::TimedOut
                }
            }
        };

        self.release_readers().await;
        debug!(process = %self.label, ?outcome, "Process stopped");
        outcome
    }

    async fn release_readers(&mut self) {
        for mut reader in self.readers.drain(..) {
            if timeout(READER_DRAIN, &mut reader).await.is_err() {
                reader.abort();
            }
        }
    }
}
