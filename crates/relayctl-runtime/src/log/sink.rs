//! Lock-free multi-producer log sink with an optional file mirror.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use crossbeam::queue::SegQueue;
use tracing::{debug, warn};

/// One operator log line with the wall-clock time it was appended.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl LogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            text: text.into(),
        }
    }

    /// `HH:MM:SS - text`, the log file line format.
    pub fn file_line(&self) -> String {
        format!("{} - {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Everything drained by one [`LogSink::flush`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBatch {
    lines: Vec<String>,
}

impl LogBatch {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The batch as one block of text, one line per entry.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

struct LogFile {
    path: PathBuf,
    file: Mutex<File>,
}

struct Inner {
    queue: SegQueue<LogEntry>,
    file: Option<LogFile>,
}

/// Cheaply cloneable handle to the shared operator log.
///
/// `append` never blocks and never fails, so it is safe to call from pipe
/// reader tasks. Only the flusher should call [`flush`](Self::flush).
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Inner>,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("pending", &self.inner.queue.len())
            .field("file", &self.inner.file.as_ref().map(|f| &f.path))
            .finish()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    /// In-memory sink with no file mirror.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: SegQueue::new(),
                file: None,
            }),
        }
    }

    /// Sink that also mirrors flushed lines into `path`.
    ///
    /// The file is truncated and a start banner written. If the file cannot
    /// be opened the sink still works, just without the mirror.
    pub fn with_log_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file = match open_truncated(path) {
            Ok(file) => Some(LogFile {
                path: path.to_path_buf(),
                file: Mutex::new(file),
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot open log file, continuing without it");
                None
            }
        };

        Self {
            inner: Arc::new(Inner {
                queue: SegQueue::new(),
                file,
            }),
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.inner.file.as_ref().map(|f| f.path.as_path())
    }

    /// Enqueue one line. Trailing line breaks are dropped.
    pub fn append(&self, line: impl Into<String>) {
        let mut text = line.into();
        let trimmed = text.trim_end_matches(['\r', '\n']).len();
        text.truncate(trimmed);
        self.inner.queue.push(LogEntry::new(text));
    }

    /// Number of lines waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Drain everything queued so far.
    ///
    /// Returns `None` when nothing was queued. Drained lines are mirrored to
    /// the log file; write failures are swallowed.
    pub fn flush(&self) -> Option<LogBatch> {
        let mut entries = Vec::new();
        while let Some(entry) = self.inner.queue.pop() {
            entries.push(entry);
        }
        if entries.is_empty() {
            return None;
        }

        if let Some(log_file) = &self.inner.file {
            write_entries(log_file, &entries);
        }

        Some(LogBatch {
            lines: entries.into_iter().map(|e| e.text).collect(),
        })
    }
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    writeln!(
        file,
        "relayctl log started - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    Ok(file)
}

fn write_entries(log_file: &LogFile, entries: &[LogEntry]) {
    let mut buf = String::new();
    for entry in entries {
        buf.push_str(&entry.file_line());
        buf.push('\n');
    }

    let Ok(mut file) = log_file.file.lock() else {
        return;
    };
    if let Err(e) = file.write_all(buf.as_bytes()).and_then(|()| file.flush()) {
        debug!(path = %log_file.path.display(), error = %e, "log file write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_flush_empty_returns_none() {
        let sink = LogSink::new();
        assert!(sink.flush().is_none());
    }

    #[test]
    fn test_flush_drains_in_order() {
        let sink = LogSink::new();
        sink.append("first\n");
        sink.append("second\r\n");
        assert_eq!(sink.pending(), 2);

        let batch = sink.flush().unwrap();
        assert_eq!(batch.lines(), ["first", "second"]);
        assert_eq!(batch.text(), "first\nsecond\n");
        assert_eq!(sink.pending(), 0);
        assert!(sink.flush().is_none());
    }

    #[test]
    fn test_per_producer_order_preserved() {
        let sink = LogSink::new();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        sink.append(format!("{p}:{i}"));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let batch = sink.flush().unwrap();
        assert_eq!(batch.len(), 800);
        for p in 0..4 {
            let seq: Vec<usize> = batch
                .lines()
                .iter()
                .filter_map(|l| l.strip_prefix(&format!("{p}:")))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..200).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_log_file_truncated_and_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "stale content\n").unwrap();

        let sink = LogSink::with_log_file(&path);
        assert_eq!(sink.log_file(), Some(path.as_path()));
        sink.append("Stream 1 starting...");
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert!(!content.contains("stale content"));
        assert!(lines[0].starts_with("relayctl log started - "));
        // HH:MM:SS - text
        assert_eq!(&lines[1][2..3], ":");
        assert!(lines[1].ends_with(" - Stream 1 starting..."));
    }

    #[test]
    fn test_unopenable_log_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a file
        let sink = LogSink::with_log_file(dir.path());
        assert!(sink.log_file().is_none());
        sink.append("still works");
        assert_eq!(sink.flush().unwrap().lines(), ["still works"]);
    }
}
