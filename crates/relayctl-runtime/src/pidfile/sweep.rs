//! Startup cleanup for a relay left running by a previous crash.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use super::io::{delete_pidfile, read_pidfile};
use super::verify::is_relay_process;
use crate::process::kill_pid;

/// What the sweep found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No PID file.
    Clean,
    /// The PID file pointed at a live relay, which was killed.
    Killed { pid: u32 },
    /// The PID file was stale (process gone or PID reused) and was removed.
    StaleRemoved { pid: u32 },
}

/// Kill a relay recorded in `pidfile` by a previous session.
///
/// The PID is only killed when it still belongs to `relay_binary`; otherwise
/// just the PID file is removed. A malformed PID file is treated as stale.
pub async fn cleanup_orphaned_relay(pidfile: &Path, relay_binary: &Path) -> io::Result<SweepOutcome> {
    let data = match read_pidfile(pidfile) {
        Ok(Some(data)) => data,
        Ok(None) => {
            debug!("No relay PID file found");
            return Ok(SweepOutcome::Clean);
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(path = %pidfile.display(), error = %e, "Removing malformed relay PID file");
            delete_pidfile(pidfile)?;
            return Ok(SweepOutcome::Clean);
        }
        Err(e) => return Err(e),
    };

    if !is_relay_process(data.pid, relay_binary) {
        debug!(pid = data.pid, "Recorded PID is not our relay, removing stale PID file");
        delete_pidfile(pidfile)?;
        return Ok(SweepOutcome::StaleRemoved { pid: data.pid });
    }

    info!(pid = data.pid, port = data.port, "Killing orphaned relay server");
    let outcome = match kill_pid(data.pid).await {
        Ok(()) => SweepOutcome::Killed { pid: data.pid },
        Err(e) => {
            warn!(pid = data.pid, error = %e, "Failed to kill orphaned relay, removing stale PID file");
            SweepOutcome::StaleRemoved { pid: data.pid }
        }
    };
    delete_pidfile(pidfile)?;
    Ok(outcome)
}
