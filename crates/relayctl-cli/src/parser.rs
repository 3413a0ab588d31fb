//! Root CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;
use relayctl_core::paths::DATA_DIR_ENV;

use crate::commands::Commands;
use crate::options::RelayOptions;

/// Supervise a local RTSP relay server and looping transcoders.
#[derive(Debug, Parser)]
#[command(name = "relayctl")]
#[command(about = "Stream local media files as RTSP through a supervised relay server")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the slot list, relay config and log
    #[arg(long = "data-dir", global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose/debug diagnostics
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub options: RelayOptions,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
