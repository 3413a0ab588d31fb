//! Periodic health checks for a running session.

use std::sync::Arc;
use std::time::Duration;

use relayctl_core::duration_ms;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::orchestrator::StreamOrchestrator;

/// Default period between health checks.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(2);

/// Run [`StreamOrchestrator::check_health`] every `period` until cancelled.
///
/// Findings are reported by the orchestrator itself (operator log and
/// tracing); the monitor only drives the schedule.
pub fn spawn_health_monitor(
    orchestrator: Arc<StreamOrchestrator>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing has started yet
        ticker.tick().await;

        debug!(period_ms = duration_ms(period), "Starting health monitor");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = orchestrator.check_health().await;
                    if !report.is_healthy() {
                        debug!(?report, "Health check found problems");
                    }
                }
                () = cancel.cancelled() => {
                    debug!("Health monitor cancelled");
                    break;
                }
            }
        }
    })
}
