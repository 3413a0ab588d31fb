//! Subcommands.
//!
//! Slot numbers on the command line are 1-based, matching the stream names
//! (`stream1` is slot 1).

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add media files to the slot list
    Add {
        /// Files to stream
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove a slot (later slots are renumbered)
    Remove {
        /// Slot number as shown by `list`
        number: usize,
    },

    /// Show the slot list
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Remove every slot
    Clear,

    /// Print the RTSP URL of every slot
    Urls,

    /// Print the relay config and effective settings
    Config,

    /// Run an interactive streaming session
    Run {
        /// Start every slot immediately
        #[arg(long)]
        start_all: bool,
    },
}
