//! Slot list and start report rendering.

use relayctl_core::SlotSnapshot;
use relayctl_runtime::StartAllReport;

use super::tables::{print_separator, truncate_string};

/// Print the slot list as a table, one row per slot.
pub fn print_slots(slots: &[SlotSnapshot]) {
    println!(
        "{:<4} {:<10} {:<8} {:<8} {:<34} File",
        "#", "Stream", "Status", "PID", "URL"
    );
    print_separator(100);

    for slot in slots {
        let status = if slot.running { "running" } else { "stopped" };
        let pid = slot.pid.map_or_else(|| "--".to_string(), |p| p.to_string());
        println!(
            "{:<4} {:<10} {:<8} {:<8} {:<34} {}",
            slot.index + 1,
            slot.name,
            status,
            pid,
            truncate_string(&slot.url, 33),
            truncate_string(&slot.source.to_string(), 60),
        );
    }
}

/// One line per outcome of a batch start.
pub fn format_start_report(report: &StartAllReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.started.is_empty() {
        lines.push(format!("Started {} stream(s)", report.started.len()));
    }
    if !report.already_running.is_empty() {
        lines.push(format!(
            "{} stream(s) were already running",
            report.already_running.len()
        ));
    }
    lines.extend(report.failures.iter().map(ToString::to_string));
    if lines.is_empty() {
        lines.push("No streams to start".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayctl_core::{SpawnError, StreamStartError};
    use std::path::PathBuf;

    #[test]
    fn test_empty_report() {
        let report = StartAllReport::default();
        assert_eq!(format_start_report(&report), vec!["No streams to start"]);
    }

    #[test]
    fn test_report_lists_failures() {
        let report = StartAllReport {
            started: vec![0, 2],
            already_running: vec![],
            failures: vec![StreamStartError::spawn(
                1,
                SpawnError::NotFound {
                    program: PathBuf::from("ffmpeg"),
                },
            )],
        };

        let lines = format_start_report(&report);
        assert_eq!(lines[0], "Started 2 stream(s)");
        assert!(lines[1].starts_with("stream 2 failed to start"));
        assert_eq!(lines.len(), 2);
    }
}
