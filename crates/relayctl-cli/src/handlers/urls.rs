//! Urls command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Print the viewer URL of every slot, one per line.
///
/// Outside a session nothing is running, so these are the URLs each slot
/// will be served under once started.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    for slot in ctx.orchestrator().slots().await {
        println!("{}", slot.url);
    }
    Ok(())
}
