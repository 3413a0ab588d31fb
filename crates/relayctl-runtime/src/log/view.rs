//! Bounded in-memory view of the operator log.

use std::collections::VecDeque;
use std::sync::Mutex;

use relayctl_core::LogDisplay;

/// Ring buffer keeping the most recent operator log lines.
///
/// Trims oldest-first once `capacity` is exceeded.
#[derive(Debug)]
pub struct LogView {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl LogView {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The last `n` retained lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.iter().skip(l.len().saturating_sub(n)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn push_lines(&self, batch: &[String]) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        for line in batch {
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(line.clone());
        }
    }
}

impl LogDisplay for LogView {
    fn show(&self, lines: &[String]) {
        self.push_lines(lines);
    }
}
