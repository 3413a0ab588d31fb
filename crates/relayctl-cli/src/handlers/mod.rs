//! Command handlers.
//!
//! Each handler receives the composed [`CliContext`] and delegates to the
//! orchestrator. Offline handlers echo the operator log lines their
//! operation produced, since no flusher runs for them.

pub mod add;
pub mod clear;
pub mod config;
pub mod list;
pub mod remove;
pub mod run;
pub mod urls;

use crate::bootstrap::CliContext;

/// Print and drain whatever the orchestrator appended to the operator log.
pub(crate) fn print_pending_log(ctx: &CliContext) {
    if let Some(batch) = ctx.log.flush() {
        for line in batch.lines() {
            println!("{line}");
        }
    }
}
