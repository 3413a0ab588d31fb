//! Clear command handler.

use anyhow::Result;

use super::print_pending_log;
use crate::bootstrap::CliContext;

/// Remove every slot from the slot list.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let count = ctx.orchestrator().len().await;
    ctx.orchestrator().clear().await;
    print_pending_log(ctx);
    println!("Removed {count} slot(s).");
    Ok(())
}
