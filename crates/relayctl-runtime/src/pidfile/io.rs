//! Atomic PID file I/O.
//!
//! Format: two-line text file
//! ```text
//! <pid>
//! <rtsp_port>
//! ```

use std::fs;
use std::io;
use std::path::Path;

/// Parsed PID file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPidFile {
    pub pid: u32,
    pub port: u16,
}

/// Write the PID file atomically (temp file + rename).
pub fn write_pidfile(path: &Path, pid: u32, port: u16) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("pid.tmp");
    fs::write(&temp_path, format!("{pid}\n{port}\n"))?;
    fs::rename(&temp_path, path)
}

/// Read the PID file. A missing file yields `Ok(None)`.
pub fn read_pidfile(path: &Path) -> io::Result<Option<RelayPidFile>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_pidfile_content(&content).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete the PID file (idempotent).
pub fn delete_pidfile(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn parse_pidfile_content(content: &str) -> io::Result<RelayPidFile> {
    let mut lines = content.lines();

    let pid = lines
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid PID"))?;

    let port = lines
        .next()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing or invalid port"))?;

    Ok(RelayPidFile { pid, port })
}
