//! Stream orchestration.
//!
//! `StreamOrchestrator` is the single control path for slots and the relay.
//! Every mutator holds one async mutex for its full duration, including
//! relay warm-up and stop waits, so operations are totally ordered and a
//! stop issued during an in-flight start waits for that start to resolve.
//!
//! Operator-facing messages go to the [`LogSink`]; diagnostics go to
//! `tracing`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use relayctl_core::{
    MediaSource, OrchestratorError, RelayError, Settings, SlotIndexError, SlotListStore,
    SlotSnapshot, StreamStartError, SupervisionMode, TranscodeCommandBuilder, TranscodeProfile,
    stream_name, stream_url,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::log::LogSink;
use crate::process::{OutputFilter, ProcessLauncher, SinkOutputHandler};
use crate::registry::StreamRegistry;
use crate::relay::{Readiness, RelaySupervisor};

/// Result of starting one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A start was performed. `pid` is the worker PID in per-slot mode and
    /// `None` in declarative mode, where the relay owns the transcoder.
    Started { pid: Option<u32> },
    /// The slot was already running; nothing was spawned.
    AlreadyRunning,
}

/// Result of a batch start. Per-slot failures do not abort the batch.
#[derive(Debug, Default)]
pub struct StartAllReport {
    pub started: Vec<usize>,
    pub already_running: Vec<usize>,
    pub failures: Vec<StreamStartError>,
}

impl StartAllReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of one health check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Slots whose worker exited on its own, with exit codes.
    pub exited: Vec<(usize, Option<i32>)>,
    /// Whether a relay process is alive after the check.
    pub relay_alive: bool,
    /// Whether the relay was found dead without having been stopped.
    pub relay_crashed: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.exited.is_empty() && !self.relay_crashed
    }
}

struct OrchestratorState {
    registry: StreamRegistry,
    relay: RelaySupervisor,
}

/// Supervises the relay server and one transcoding worker per active slot.
pub struct StreamOrchestrator {
    state: Mutex<OrchestratorState>,
    settings: Settings,
    profile: TranscodeProfile,
    launcher: Arc<dyn ProcessLauncher>,
    log: LogSink,
    store: Option<SlotListStore>,
}

impl std::fmt::Debug for StreamOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamOrchestrator")
            .field("mode", &self.settings.mode)
            .field("rtsp_port", &self.settings.rtsp_port)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl StreamOrchestrator {
    pub fn new(
        settings: Settings,
        config_path: impl Into<PathBuf>,
        launcher: Arc<dyn ProcessLauncher>,
        log: LogSink,
    ) -> Self {
        let relay = RelaySupervisor::new(
            &settings,
            config_path,
            Arc::clone(&launcher),
            log.clone(),
        );
        let registry = StreamRegistry::new(settings.stop_grace());

        Self {
            state: Mutex::new(OrchestratorState { registry, relay }),
            profile: TranscodeProfile::from_settings(&settings),
            settings,
            launcher,
            log,
            store: None,
        }
    }

    /// Persist the slot list through `store` after every change.
    #[must_use]
    pub fn with_slot_store(mut self, store: SlotListStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Record the relay PID in `path` while it runs.
    #[must_use]
    pub fn with_relay_pidfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.state.get_mut().relay.set_pidfile(path);
        self
    }

    #[must_use]
    pub fn with_relay_readiness(mut self, readiness: Readiness) -> Self {
        self.state.get_mut().relay.set_readiness(readiness);
        self
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn mode(&self) -> SupervisionMode {
        self.settings.mode
    }

    pub const fn log(&self) -> &LogSink {
        &self.log
    }

    /// Restore slots from the slot store. Entries whose file is gone were
    /// already dropped by the store. Returns the number of slots added.
    pub async fn load_persisted(&self) -> std::io::Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let sources = store.load()?;

        let mut state = self.state.lock().await;
        let added = sources
            .into_iter()
            .map(|source| state.registry.add(source))
            .filter(|&added| added)
            .count();
        debug!(added, path = %store.path().display(), "Restored slot list");
        Ok(added)
    }

    /// Validate `path` and append it as a stopped slot.
    ///
    /// Returns `Ok(false)` for a duplicate.
    pub async fn add_source(&self, path: impl AsRef<Path>) -> Result<bool, OrchestratorError> {
        let source = MediaSource::new(path)?;
        let mut state = self.state.lock().await;
        if !state.registry.add(source.clone()) {
            return Ok(false);
        }
        let number = state.registry.len();
        self.log
            .append(format!("Stream {number} added: {}", source.file_name()));
        self.persist(&state.registry);
        Ok(true)
    }

    /// Start one slot.
    pub async fn start_one(&self, index: usize) -> Result<StartOutcome, OrchestratorError> {
        let mut state = self.state.lock().await;
        state.registry.check_index(index)?;

        match self.mode() {
            SupervisionMode::PerSlot => {
                let result = self.start_worker(&mut state, index).await;
                if result.is_err() {
                    self.shutdown_relay_if_idle(&mut state).await;
                }
                result
            }
            SupervisionMode::Declarative => {
                if state.registry.get(index).is_some_and(|s| s.is_running())
                    && state.relay.is_alive()
                {
                    return Ok(StartOutcome::AlreadyRunning);
                }
                self.log.append(format!("Stream {} starting...", index + 1));
                state.registry.set_running(index, true, None)?;
                if let Err(e) = self.reconcile_relay(&mut state).await {
                    self.log
                        .append(format!("Stream {} failed to start: {e}", index + 1));
                    return Err(StreamStartError::relay(index, e).into());
                }
                self.log_started(&state.registry, index);
                Ok(StartOutcome::Started { pid: None })
            }
        }
    }

    /// Stop one slot. Stopping a stopped slot is a no-op; termination
    /// problems are logged, never returned.
    pub async fn stop_one(&self, index: usize) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        state.registry.check_index(index)?;

        let was_running = state.registry.get(index).is_some_and(|s| s.is_running());
        state.registry.stop_worker(index).await?;
        if was_running {
            self.log_stopped(&state.registry, index);
        }

        match self.mode() {
            SupervisionMode::PerSlot => self.shutdown_relay_if_idle(&mut state).await,
            SupervisionMode::Declarative if was_running => {
                if let Err(e) = self.reconcile_relay(&mut state).await {
                    error!(index, error = %e, "Relay restart after stop failed");
                }
            }
            SupervisionMode::Declarative => {}
        }
        Ok(())
    }

    /// Start every slot that is not running.
    ///
    /// The relay is brought up once first; if that fails nothing can start
    /// and the whole batch fails. Individual worker failures are collected
    /// in the report.
    pub async fn start_all(&self) -> Result<StartAllReport, OrchestratorError> {
        let mut state = self.state.lock().await;
        let mut report = StartAllReport::default();
        if state.registry.is_empty() {
            return Ok(report);
        }
        self.log.append("Starting all streams...");

        match self.mode() {
            SupervisionMode::PerSlot => {
                let active = state.registry.active_sources();
                if let Err(e) = state.relay.ensure_running(&active).await {
                    self.log.append(format!("Relay server failed to start: {e}"));
                    return Err(e.into());
                }

                for index in 0..state.registry.len() {
                    match self.start_worker(&mut state, index).await {
                        Ok(StartOutcome::Started { .. }) => report.started.push(index),
                        Ok(StartOutcome::AlreadyRunning) => report.already_running.push(index),
                        Err(OrchestratorError::StreamStart(e)) => report.failures.push(e),
                        Err(e) => return Err(e),
                    }
                }
                self.shutdown_relay_if_idle(&mut state).await;
            }
            SupervisionMode::Declarative => {
                for index in 0..state.registry.len() {
                    if state.registry.get(index).is_some_and(|s| s.is_running()) {
                        report.already_running.push(index);
                    } else {
                        state.registry.set_running(index, true, None)?;
                        report.started.push(index);
                    }
                }
                if let Err(e) = self.restart_relay(&mut state).await {
                    self.log.append(format!("Relay server failed to start: {e}"));
                    return Err(e.into());
                }
                for &index in &report.started {
                    self.log_started(&state.registry, index);
                }
            }
        }

        info!(
            started = report.started.len(),
            already_running = report.already_running.len(),
            failed = report.failures.len(),
            "Batch start finished"
        );
        self.log.append(format!(
            "{} RTSP streams running",
            state.registry.running_count()
        ));
        Ok(report)
    }

    /// Stop every stream and the relay. Slots are kept.
    pub async fn stop_all(&self) {
        let mut state = self.state.lock().await;
        self.stop_everything(&mut state).await;
        self.log.append("All RTSP streams stopped");
    }

    /// Stop (if running) and remove a slot. Later slots shift down and are
    /// renamed; running workers among them are restarted under the new name.
    pub async fn delete_one(&self, index: usize) -> Result<MediaSource, OrchestratorError> {
        let mut state = self.state.lock().await;
        state.registry.check_index(index)?;

        let was_running = state.registry.get(index).is_some_and(|s| s.is_running());
        let shifted: Vec<usize> = state
            .registry
            .running_indices()
            .into_iter()
            .filter(|&i| i > index)
            .map(|i| i - 1)
            .collect();

        let removed = state.registry.remove(index).await?;
        self.log.append(format!(
            "Stream {} deleted: {}",
            index + 1,
            removed.file_name()
        ));
        self.persist(&state.registry);

        match self.mode() {
            SupervisionMode::PerSlot => {
                for new_index in shifted {
                    self.restart_renumbered(&mut state, new_index).await;
                }
                self.shutdown_relay_if_idle(&mut state).await;
            }
            SupervisionMode::Declarative => {
                if was_running || !shifted.is_empty() {
                    if let Err(e) = self.reconcile_relay(&mut state).await {
                        error!(index, error = %e, "Relay restart after delete failed");
                    }
                    for new_index in shifted {
                        self.log_renumbered(new_index);
                    }
                }
            }
        }
        Ok(removed)
    }

    /// Stop everything and remove every slot.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        self.stop_everything(&mut state).await;
        state.registry.clear().await;
        self.persist(&state.registry);
        self.log.append("All streams cleared");
    }

    /// Stop every worker and the relay and persist the slot list. Never
    /// fails.
    pub async fn shutdown_all(&self) {
        let mut state = self.state.lock().await;
        self.stop_everything(&mut state).await;
        self.persist(&state.registry);
        info!("Orchestrator shut down");
    }

    /// Reap workers that died on their own and check the relay.
    pub async fn check_health(&self) -> HealthReport {
        let mut state = self.state.lock().await;
        let mut report = HealthReport {
            exited: state.registry.reap_exited(),
            ..HealthReport::default()
        };

        for &(index, code) in &report.exited {
            warn!(index, ?code, "Worker exited unexpectedly");
            self.log.append(format!(
                "Stream {} exited unexpectedly (code {})",
                index + 1,
                code.map_or_else(|| "signal".to_string(), |c| c.to_string())
            ));
        }

        if let Some(code) = state.relay.reap() {
            report.relay_crashed = true;
            error!(?code, "Relay server exited unexpectedly");
            self.log.append("Relay server exited unexpectedly");
            if self.mode() == SupervisionMode::Declarative {
                // The relay took its transcoders down with it
                state.registry.stop_all_workers().await;
            }
        }

        if self.mode() == SupervisionMode::PerSlot && !report.exited.is_empty() {
            self.shutdown_relay_if_idle(&mut state).await;
        }

        report.relay_alive = state.relay.is_alive();
        report
    }

    pub async fn slots(&self) -> Vec<SlotSnapshot> {
        let state = self.state.lock().await;
        state.registry.snapshot(self.settings.rtsp_port)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.registry.is_empty()
    }

    pub async fn running_count(&self) -> usize {
        self.state.lock().await.registry.running_count()
    }

    /// Viewer URLs of running streams.
    pub async fn stream_urls(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .registry
            .running_indices()
            .into_iter()
            .map(|i| stream_url(self.settings.rtsp_port, i))
            .collect()
    }

    pub async fn relay_alive(&self) -> bool {
        self.state.lock().await.relay.is_alive()
    }

    /// The relay config that would be written for the current slot state.
    pub async fn config_preview(&self) -> Result<String, RelayError> {
        let state = self.state.lock().await;
        state.relay.render_config(&state.registry.active_sources())
    }

    fn worker_filter(&self) -> OutputFilter {
        if self.settings.verbose_output {
            OutputFilter::PassThrough
        } else {
            OutputFilter::Transcoder
        }
    }

    /// Per-slot start: relay first, then the worker.
    async fn start_worker(
        &self,
        state: &mut OrchestratorState,
        index: usize,
    ) -> Result<StartOutcome, OrchestratorError> {
        if state.registry.is_live(index)? {
            return Ok(StartOutcome::AlreadyRunning);
        }
        // Release a worker that died without being reaped
        if let Some(stale) = state.registry.set_running(index, false, None)? {
            stale.stop(state.registry.stop_grace()).await;
        }

        self.log.append(format!("Stream {} starting...", index + 1));

        let active = state.registry.active_sources();
        if let Err(e) = state.relay.ensure_running(&active).await {
            self.log.append(format!(
                "Stream {} failed to start: relay unavailable: {e}",
                index + 1
            ));
            return Err(StreamStartError::relay(index, e).into());
        }

        let source = state
            .registry
            .get(index)
            .map(|s| s.source().clone())
            .ok_or(SlotIndexError {
                index,
                len: state.registry.len(),
            })?;
        let command = TranscodeCommandBuilder::new(&self.settings.transcoder_binary, &source, index)
            .profile(self.profile)
            .build();
        self.log.append(format!("Transcoder command: {command}"));

        let output = Arc::new(SinkOutputHandler::new(
            self.log.clone(),
            format!("Stream {}", index + 1),
            self.worker_filter(),
        ));
        let handle = match self.launcher.launch(&stream_name(index), &command, output) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(index, error = %e, "Failed to spawn transcoder");
                self.log
                    .append(format!("Stream {} failed to start: {e}", index + 1));
                return Err(StreamStartError::spawn(index, e).into());
            }
        };

        let pid = handle.pid();
        state.registry.set_running(index, true, Some(handle))?;
        info!(index, ?pid, source = %source, "Stream started");
        self.log_started(&state.registry, index);
        Ok(StartOutcome::Started { pid })
    }

    /// Per-slot: a worker now sits at a new index and must publish under
    /// the new stream name.
    async fn restart_renumbered(&self, state: &mut OrchestratorState, new_index: usize) {
        if let Err(e) = state.registry.stop_worker(new_index).await {
            warn!(index = new_index, error = %e, "Could not stop renumbered worker");
            return;
        }
        self.log_renumbered(new_index);
        if let Err(e) = self.start_worker(state, new_index).await {
            error!(index = new_index, error = %e, "Failed to restart renumbered stream");
        }
    }

    /// Declarative: make the relay match the active slot set.
    ///
    /// Restarts the relay with the new config, or shuts it down when no slot
    /// is active. If the restart fails the relay is down, so every slot is
    /// marked stopped.
    async fn reconcile_relay(&self, state: &mut OrchestratorState) -> Result<(), RelayError> {
        if state.registry.running_count() == 0 {
            state.relay.shutdown().await;
            return Ok(());
        }
        self.restart_relay(state).await
    }

    async fn restart_relay(&self, state: &mut OrchestratorState) -> Result<(), RelayError> {
        let active = state.registry.active_sources();
        match state.relay.restart(&active).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = %e, "Relay restart failed, marking all streams stopped");
                state.registry.stop_all_workers().await;
                Err(e)
            }
        }
    }

    async fn shutdown_relay_if_idle(&self, state: &mut OrchestratorState) {
        if state.registry.running_count() == 0 && state.relay.is_started() {
            debug!("No active streams left, stopping relay");
            state.relay.shutdown().await;
        }
    }

    async fn stop_everything(&self, state: &mut OrchestratorState) {
        for (index, outcome) in state.registry.stop_all_workers().await {
            debug!(index, ?outcome, "Worker stopped");
            self.log_stopped(&state.registry, index);
        }
        state.relay.shutdown().await;
    }

    fn log_started(&self, registry: &StreamRegistry, index: usize) {
        if let Some(slot) = registry.get(index) {
            self.log.append(format!(
                "Stream {} started: {}",
                index + 1,
                slot.source().file_name()
            ));
        }
    }

    fn log_stopped(&self, registry: &StreamRegistry, index: usize) {
        if let Some(slot) = registry.get(index) {
            self.log.append(format!(
                "Stream {} stopped: {}",
                index + 1,
                slot.source().file_name()
            ));
        }
    }

    fn log_renumbered(&self, new_index: usize) {
        self.log.append(format!(
            "Stream {} is now {} ({})",
            new_index + 2,
            stream_name(new_index),
            stream_url(self.settings.rtsp_port, new_index)
        ));
    }

    fn persist(&self, registry: &StreamRegistry) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&registry.sources()) {
            warn!(path = %store.path().display(), error = %e, "Failed to save slot list");
        }
    }
}
