//! Checks that a recorded PID still belongs to the relay binary.

use std::ffi::OsStr;
use std::path::Path;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Check whether `pid` is a running instance of `relay_binary`.
///
/// Matches on the executable file stem (`mediamtx` for
/// `/usr/local/bin/mediamtx` or `mediamtx.exe`) or the process name.
/// Returns `false` whenever the process cannot be inspected,
/// so a reused PID is never mistaken for the relay.
pub fn is_relay_process(pid: u32, relay_binary: &Path) -> bool {
    let Some(expected) = relay_binary.file_stem() else {
        return false;
    };

    let sys_pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[sys_pid]),
        true,
        ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
    );

    let Some(process) = sys.process(sys_pid) else {
        return false;
    };

    let exe_matches = process
        .exe()
        .and_then(Path::file_stem)
        .is_some_and(|stem| stem_matches(stem, expected));

    // Multi-call binaries report a different exe than the invoked name
    exe_matches
        || Path::new(process.name())
            .file_stem()
            .is_some_and(|stem| stem_matches(stem, expected))
}

fn stem_matches(actual: &OsStr, expected: &OsStr) -> bool {
    if cfg!(windows) {
        actual.eq_ignore_ascii_case(expected)
    } else {
        actual == expected
    }
}

/// Check if a PID exists (without verifying what it is).
///
/// Uses `kill` with the null signal, which only checks deliverability.
#[cfg(unix)]
pub fn pid_exists(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid as NixPid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match signal::kill(NixPid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // Exists, but we lack permission
        Err(_) => true,
    }
}

#[cfg(not(unix))]
pub fn pid_exists(pid: u32) -> bool {
    let sys_pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
    sys.process(sys_pid).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_exists_for_self() {
        assert!(pid_exists(std::process::id()));
    }

    #[test]
    #[cfg(unix)]
    fn pid_exists_false_for_impossible_pid() {
        assert!(!pid_exists(999_999));
    }

    #[test]
    fn is_relay_process_false_for_self() {
        assert!(!is_relay_process(std::process::id(), Path::new("mediamtx")));
    }

    #[test]
    fn is_relay_process_false_for_missing_pid() {
        assert!(!is_relay_process(999_999, Path::new("mediamtx")));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn is_relay_process_matches_binary_stem() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();

        assert!(is_relay_process(pid, Path::new("/usr/bin/sleep")));
        assert!(!is_relay_process(pid, Path::new("mediamtx")));

        child.kill().await.unwrap();
    }
}
