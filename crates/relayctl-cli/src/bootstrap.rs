//! CLI bootstrap - the composition root.
//!
//! This module is the only place where the runtime is wired together:
//! settings, data paths, the operator log, the process launcher and the
//! orchestrator. Handlers receive the composed [`CliContext`].

use std::sync::Arc;

use relayctl_core::{AppPaths, Settings, SlotListStore};
use relayctl_runtime::{
    LogSink, StreamOrchestrator, SweepOutcome, SystemLauncher, cleanup_orphaned_relay,
};
use tracing::{debug, info};

use crate::error::CliError;
use crate::parser::Cli;

/// What the command is going to do with the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Edits or inspects the slot list. Never launches processes, so it
    /// must not touch a relay another session may be running.
    Offline,
    /// Launches the relay and transcoders. Sweeps a relay orphaned by a
    /// previous session and starts a fresh log file.
    Live,
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub paths: AppPaths,
    pub log: LogSink,
    pub orchestrator: Arc<StreamOrchestrator>,
}

impl CliContext {
    pub fn orchestrator(&self) -> &StreamOrchestrator {
        &self.orchestrator
    }
}

/// Build a [`CliContext`] from parsed arguments.
///
/// # Errors
///
/// Fails on invalid settings, an unusable data directory, or an unreadable
/// slot list.
pub async fn bootstrap(cli: &Cli, kind: SessionKind) -> Result<CliContext, CliError> {
    let settings = cli.options.to_settings()?;

    let paths = AppPaths::resolve(cli.data_dir.as_deref())?;
    paths.ensure()?;
    debug!(root = %paths.root().display(), ?kind, "Resolved data directory");

    let log = match kind {
        SessionKind::Offline => LogSink::new(),
        SessionKind::Live => {
            let outcome =
                cleanup_orphaned_relay(&paths.relay_pidfile(), &settings.relay_binary).await?;
            let log = LogSink::with_log_file(paths.log_file());
            if let SweepOutcome::Killed { pid } = outcome {
                info!(pid, "Killed orphaned relay server");
                log.append(format!(
                    "Stopped relay server left over from a previous session (PID {pid})"
                ));
            }
            log
        }
    };

    let orchestrator = StreamOrchestrator::new(
        settings.clone(),
        paths.relay_config(),
        Arc::new(SystemLauncher),
        log.clone(),
    )
    .with_slot_store(SlotListStore::new(paths.slot_list()))
    .with_relay_pidfile(paths.relay_pidfile());

    let restored = orchestrator.load_persisted().await?;
    debug!(restored, "Loaded persisted slots");

    Ok(CliContext {
        settings,
        paths,
        log,
        orchestrator: Arc::new(orchestrator),
    })
}
