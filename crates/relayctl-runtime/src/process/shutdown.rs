//! Kill processes we only know by PID (no `Child` handle, so no reaping).

use std::io;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::sleep;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Poll step while waiting for a signalled process to disappear.
#[cfg(unix)]
const POLL_STEP: Duration = Duration::from_millis(100);

/// Polls per phase (2 s total).
#[cfg(unix)]
const POLLS_PER_PHASE: usize = 20;

/// Kill a process by PID with SIGTERM → SIGKILL escalation.
///
/// Returns `Ok(())` if the process was killed or was already gone. The
/// caller is responsible for checking that the PID is really the process it
/// means to kill.
pub async fn kill_pid(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        kill_pid_unix(pid).await
    }

    #[cfg(not(unix))]
    {
        kill_pid_sysinfo(pid)
    }
}

#[cfg(unix)]
async fn kill_pid_unix(pid: u32) -> io::Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    let nix_pid = Pid::from_raw(raw);

    for sig in [Signal::SIGTERM, Signal::SIGKILL] {
        match signal::kill(nix_pid, sig) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(()),
            Err(e) => return Err(io::Error::other(e)),
        }

        for _ in 0..POLLS_PER_PHASE {
            sleep(POLL_STEP).await;
            if matches!(signal::kill(nix_pid, None), Err(Errno::ESRCH)) {
                return Ok(());
            }
        }
    }

    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("process {pid} did not exit after SIGKILL"),
    ))
}

#[cfg(not(unix))]
fn kill_pid_sysinfo(pid: u32) -> io::Result<()> {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    let sys_pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);

    match sys.process(sys_pid) {
        None => Ok(()),
        Some(process) if process.kill() => Ok(()),
        Some(_) => Err(io::Error::other(format!("failed to kill process {pid}"))),
    }
}
