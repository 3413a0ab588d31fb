//! Spawn port shared by the relay supervisor and the orchestrator.

use std::sync::Arc;

use relayctl_core::{CommandSpec, OutputHandler, SpawnError};

use super::ProcessHandle;

/// Launches external processes.
///
/// Every spawn in the runtime (relay server and transcoders) goes through
/// this trait so tests can substitute failing or fake launchers.
pub trait ProcessLauncher: Send + Sync {
    fn launch(
        &self,
        label: &str,
        command: &CommandSpec,
        output: Arc<dyn OutputHandler>,
    ) -> Result<ProcessHandle, SpawnError>;
}

/// Launches real OS processes via [`ProcessHandle::start`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(
        &self,
        label: &str,
        command: &CommandSpec,
        output: Arc<dyn OutputHandler>,
    ) -> Result<ProcessHandle, SpawnError> {
        ProcessHandle::start(label, command, output)
    }
}
