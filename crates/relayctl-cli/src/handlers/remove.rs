//! Remove command handler.
//!
//! Removes one slot. The media file stays on disk; only the slot list entry
//! goes away.

use anyhow::Result;

use super::print_pending_log;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the remove command for the 1-based slot `number`.
///
/// # Errors
///
/// Returns [`CliError::Arguments`] when no slot has that number.
pub async fn execute(ctx: &CliContext, number: usize) -> Result<()> {
    let count = ctx.orchestrator().len().await;
    if number == 0 || number > count {
        println!("Use 'relayctl list' to see the slot numbers.");
        return Err(CliError::Arguments(format!(
            "no slot {number} (have {count} slot(s))"
        ))
        .into());
    }

    ctx.orchestrator()
        .delete_one(number - 1)
        .await
        .map_err(CliError::from)?;
    print_pending_log(ctx);

    if number < count {
        println!(
            "Slots {}-{} moved up one place; their stream URLs changed.",
            number + 1,
            count
        );
    }
    Ok(())
}
