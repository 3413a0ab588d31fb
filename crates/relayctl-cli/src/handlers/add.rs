//! Add command handler.
//!
//! Appends media files to the slot list as stopped slots.

use std::path::PathBuf;

use anyhow::Result;

use super::print_pending_log;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the add command.
///
/// Every file is attempted; duplicates are reported and skipped.
///
/// # Errors
///
/// Returns [`CliError::Arguments`] naming the files that could not be added
/// (missing, not a regular file) after the others were added.
pub async fn execute(ctx: &CliContext, files: &[PathBuf]) -> Result<()> {
    let mut rejected = Vec::new();

    for file in files {
        match ctx.orchestrator().add_source(file).await {
            Ok(true) => {}
            Ok(false) => println!("Already in the slot list: {}", file.display()),
            Err(e) => {
                eprintln!("Cannot add {}: {e}", file.display());
                rejected.push(file.display().to_string());
            }
        }
    }
    print_pending_log(ctx);

    if !rejected.is_empty() {
        return Err(CliError::Arguments(format!("not added: {}", rejected.join(", "))).into());
    }
    Ok(())
}
