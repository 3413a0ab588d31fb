//! Config command handler.
//!
//! Shows the effective settings and the relay config that a session would
//! write with every slot running.

use anyhow::Result;
use relayctl_core::RelayConfigRenderer;

use crate::bootstrap::CliContext;
use crate::presentation::print_separator;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    println!("Data directory: {}", ctx.paths.root().display());
    println!("Settings:");
    println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
    println!();

    let all: Vec<_> = ctx
        .orchestrator()
        .slots()
        .await
        .into_iter()
        .map(|slot| (slot.index, slot.source))
        .collect();
    let rendered = RelayConfigRenderer::from_settings(&ctx.settings).render(&all)?;

    println!(
        "Relay config ({}, every slot running):",
        ctx.paths.relay_config().display()
    );
    print_separator(60);
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}
