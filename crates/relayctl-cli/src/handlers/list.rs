//! List command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_slots;

/// Execute the list command, as a table or as JSON.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let slots = ctx.orchestrator().slots().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&slots)?);
        return Ok(());
    }

    if slots.is_empty() {
        println!("The slot list is empty.");
        println!("Use 'relayctl add <file>' to add a media file.");
        return Ok(());
    }

    println!("{} slot(s):\n", slots.len());
    print_slots(&slots);
    Ok(())
}
