//! Periodic consumer of the [`LogSink`].

use std::sync::Arc;
use std::time::Duration;

use relayctl_core::LogDisplay;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::LogSink;

/// Spawn the single flusher task.
///
/// Every `period` the sink is drained and a non-empty batch handed to
/// `display`. On cancellation one last flush runs before the task exits, so
/// nothing appended before shutdown is lost.
pub fn spawn_log_flusher(
    sink: LogSink,
    period: Duration,
    display: Arc<dyn LogDisplay>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(batch) = sink.flush() {
                        display.show(batch.lines());
                    }
                }
                () = cancel.cancelled() => break,
            }
        }

        if let Some(batch) = sink.flush() {
            display.show(batch.lines());
        }
        debug!("Log flusher stopped");
    })
}
