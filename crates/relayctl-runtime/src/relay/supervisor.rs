//! Relay server lifecycle.
//!
//! The supervisor owns at most one relay process. It is not internally
//! synchronized: the orchestrator keeps it inside its state mutex, so every
//! start, restart and shutdown is already serialized.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use relayctl_core::{
    CommandSpec, ConfigWriteError, MediaSource, OutputHandler, RelayConfigRenderer, RelayError,
    Settings, SupervisionMode,
};
use tracing::{debug, info, warn};

use super::Readiness;
use crate::log::LogSink;
use crate::pidfile::{delete_pidfile, write_pidfile};
use crate::process::{OutputFilter, ProcessHandle, ProcessLauncher, SinkOutputHandler};

const RELAY_LABEL: &str = "Relay";

/// Starts, restarts and stops the relay server.
pub struct RelaySupervisor {
    renderer: RelayConfigRenderer,
    relay_binary: PathBuf,
    rtsp_port: u16,
    config_path: PathBuf,
    pidfile: Option<PathBuf>,
    readiness: Readiness,
    stop_grace: Duration,
    launcher: Arc<dyn ProcessLauncher>,
    output: Arc<dyn OutputHandler>,
    log: LogSink,
    handle: Option<ProcessHandle>,
    config_text: Option<String>,
}

impl std::fmt::Debug for RelaySupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySupervisor")
            .field("mode", &self.renderer.mode())
            .field("relay_binary", &self.relay_binary)
            .field("rtsp_port", &self.rtsp_port)
            .field("config_path", &self.config_path)
            .field("readiness", &self.readiness)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl RelaySupervisor {
    pub fn new(
        settings: &Settings,
        config_path: impl Into<PathBuf>,
        launcher: Arc<dyn ProcessLauncher>,
        log: LogSink,
    ) -> Self {
        let filter = if settings.verbose_output {
            OutputFilter::PassThrough
        } else {
            OutputFilter::Relay
        };
        let output = Arc::new(SinkOutputHandler::new(log.clone(), RELAY_LABEL, filter));

        Self {
            renderer: RelayConfigRenderer::from_settings(settings),
            relay_binary: settings.relay_binary.clone(),
            rtsp_port: settings.rtsp_port,
            config_path: config_path.into(),
            pidfile: None,
            readiness: Readiness::from_settings(settings),
            stop_grace: settings.stop_grace(),
            launcher,
            output,
            log,
            handle: None,
            config_text: None,
        }
    }

    /// Record the relay PID in `path` while it runs.
    #[must_use]
    pub fn with_pidfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.set_pidfile(path);
        self
    }

    #[must_use]
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.set_readiness(readiness);
        self
    }

    pub fn set_pidfile(&mut self, path: impl Into<PathBuf>) {
        self.pidfile = Some(path.into());
    }

    pub const fn set_readiness(&mut self, readiness: Readiness) {
        self.readiness = readiness;
    }

    pub const fn mode(&self) -> SupervisionMode {
        self.renderer.mode()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().and_then(ProcessHandle::pid)
    }

    /// Config text last written to disk. Kept after shutdown so it still
    /// describes what the previous relay ran with.
    pub fn config_text(&self) -> Option<&str> {
        self.config_text.as_deref()
    }

    /// Render the config for `active` without writing it.
    pub fn render_config(&self, active: &[(usize, MediaSource)]) -> Result<String, RelayError> {
        Ok(self.renderer.render(active)?)
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&mut self) -> bool {
        self.handle.as_mut().is_some_and(ProcessHandle::is_alive)
    }

    /// Whether a relay handle is held, alive or not.
    pub const fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the handle of a relay that exited on its own.
    ///
    /// Returns the exit code when that happened.
    pub fn reap(&mut self) -> Option<Option<i32>> {
        let code = self.handle.as_mut()?.try_exit()?;
        self.handle = None;
        self.remove_pidfile();
        Some(code)
    }

    /// Start the relay if it is not already running.
    ///
    /// Returns `Ok(false)` when a live relay was already present. Otherwise
    /// writes the config for `active`, launches the relay and waits for it
    /// to become ready; returns `Ok(true)` once it is. On any failure no
    /// relay is left running.
    pub async fn ensure_running(
        &mut self,
        active: &[(usize, MediaSource)],
    ) -> Result<bool, RelayError> {
        if self.is_alive() {
            return Ok(false);
        }
        if let Some(code) = self.reap() {
            warn!(?code, "Relay had exited, starting a new instance");
            self.log.append(format!("Relay server exited (code {})", fmt_code(code)));
        }

        let text = self.render_config(active)?;
        write_config(&self.config_path, &text)?;
        debug!(path = %self.config_path.display(), "Wrote relay config");

        let command =
            CommandSpec::new(&self.relay_binary).arg(self.config_path.display().to_string());
        let mut handle = self
            .launcher
            .launch(RELAY_LABEL, &command, Arc::clone(&self.output))
            .map_err(RelayError::Spawn)?;

        if let (Some(path), Some(pid)) = (&self.pidfile, handle.pid())
            && let Err(e) = write_pidfile(path, pid, self.rtsp_port)
        {
            warn!(path = %path.display(), error = %e, "Failed to write relay PID file");
        }

        if let Err(e) = self.readiness.wait(self.rtsp_port, &mut handle).await {
            warn!(error = %e, "Relay failed to become ready");
            handle.stop(self.stop_grace).await;
            self.remove_pidfile();
            return Err(e);
        }

        info!(pid = ?handle.pid(), port = self.rtsp_port, mode = %self.mode(), "Relay server started");
        self.log.append(format!(
            "Relay server started on port {}",
            self.rtsp_port
        ));
        self.handle = Some(handle);
        self.config_text = Some(text);
        Ok(true)
    }

    /// Stop the current relay (if any) and start a new one for `active`.
    pub async fn restart(&mut self, active: &[(usize, MediaSource)]) -> Result<(), RelayError> {
        self.shutdown().await;
        self.ensure_running(active).await.map(|_| ())
    }

    /// Force-stop the relay. Idempotent; never fails.
    pub async fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let pid = handle.pid();
        let outcome = handle.stop(self.stop_grace).await;
        if outcome.is_timeout() {
            warn!(?pid, "Relay did not confirm exit within grace period");
        }
        self.remove_pidfile();
        info!(?pid, ?outcome, "Relay server stopped");
        self.log.append("Relay server stopped");
    }

    fn remove_pidfile(&self) {
        if let Some(path) = &self.pidfile
            && let Err(e) = delete_pidfile(path)
        {
            debug!(path = %path.display(), error = %e, "Failed to delete relay PID file");
        }
    }
}

fn fmt_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Write the config atomically so the relay never reads a partial file.
fn write_config(path: &Path, text: &str) -> Result<(), ConfigWriteError> {
    let wrap = |source| ConfigWriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    let temp = path.with_extension("yml.tmp");
    fs::write(&temp, text).map_err(wrap)?;
    fs::rename(&temp, path).map_err(wrap)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use relayctl_core::SpawnError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Runs `sleep 30` (or `exit_code` via sh) in place of the real relay.
    struct FakeRelay {
        launches: AtomicUsize,
        exit_code: Option<i32>,
        fail: bool,
    }

    impl FakeRelay {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                launches: AtomicUsize::new(0),
                exit_code: None,
                fail: false,
            })
        }
    }

    impl ProcessLauncher for FakeRelay {
        fn launch(
            &self,
            label: &str,
            _command: &CommandSpec,
            output: Arc<dyn OutputHandler>,
        ) -> Result<ProcessHandle, SpawnError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SpawnError::NotFound {
                    program: PathBuf::from("mediamtx"),
                });
            }
            let command = match self.exit_code {
                Some(code) => CommandSpec::new("sh").arg("-c").arg(format!("exit {code}")),
                None => CommandSpec::new("sleep").arg("30"),
            };
            ProcessHandle::start(label, &command, output)
        }
    }

    fn supervisor(dir: &Path, launcher: Arc<FakeRelay>) -> RelaySupervisor {
        RelaySupervisor::new(
            &Settings::with_defaults(),
            dir.join("mediamtx.yml"),
            launcher,
            LogSink::new(),
        )
        .with_pidfile(dir.join("relay.pid"))
        .with_readiness(Readiness::FixedDelay(Duration::from_millis(50)))
    }

    #[tokio::test]
    async fn test_ensure_running_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeRelay::new();
        let mut relay = supervisor(dir.path(), Arc::clone(&launcher));

        assert!(relay.ensure_running(&[]).await.unwrap());
        assert!(!relay.ensure_running(&[]).await.unwrap());
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        assert!(relay.is_alive());

        let written = fs::read_to_string(dir.path().join("mediamtx.yml")).unwrap();
        assert!(written.contains("    source: publisher"));
        assert_eq!(relay.config_text(), Some(written.as_str()));

        let pidfile = fs::read_to_string(dir.path().join("relay.pid")).unwrap();
        assert_eq!(pidfile, format!("{}\n8554\n", relay.pid().unwrap()));

        relay.shutdown().await;
        assert!(!relay.is_alive());
        assert!(!dir.path().join("relay.pid").exists());
        assert_eq!(relay.config_text(), Some(written.as_str()));
        // Second shutdown is a no-op
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_config_write_failure_aborts_launch() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let launcher = FakeRelay::new();
        let mut relay = RelaySupervisor::new(
            &Settings::with_defaults(),
            blocker.join("mediamtx.yml"),
            Arc::clone(&launcher) as Arc<dyn ProcessLauncher>,
            LogSink::new(),
        );

        let err = relay.ensure_running(&[]).await.unwrap_err();
        assert!(matches!(err, RelayError::ConfigWrite(_)));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Arc::new(FakeRelay {
            launches: AtomicUsize::new(0),
            exit_code: None,
            fail: true,
        });
        let mut relay = supervisor(dir.path(), launcher);

        let err = relay.ensure_running(&[]).await.unwrap_err();
        assert!(matches!(err, RelayError::Spawn(SpawnError::NotFound { .. })));
        assert!(!relay.is_started());
    }

    #[tokio::test]
    async fn test_relay_exiting_during_warmup_leaves_nothing_running() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Arc::new(FakeRelay {
            launches: AtomicUsize::new(0),
            exit_code: Some(1),
            fail: false,
        });
        let mut relay = supervisor(dir.path(), launcher)
            .with_readiness(Readiness::FixedDelay(Duration::from_millis(300)));

        let err = relay.ensure_running(&[]).await.unwrap_err();
        assert!(matches!(err, RelayError::ExitedDuringStartup { code: Some(1) }));
        assert!(!relay.is_started());
        assert!(!dir.path().join("relay.pid").exists());
    }

    #[tokio::test]
    async fn test_restart_launches_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeRelay::new();
        let mut relay = supervisor(dir.path(), Arc::clone(&launcher));

        relay.ensure_running(&[]).await.unwrap();
        let first = relay.pid();
        relay.restart(&[]).await.unwrap();
        assert_ne!(relay.pid(), first);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
        relay.shutdown().await;
    }
}
