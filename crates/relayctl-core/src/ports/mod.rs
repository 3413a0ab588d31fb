//! Port definitions (trait abstractions) for collaborators.
//!
//! # Design Rules
//!
//! - No process or filesystem implementation details
//! - Implementations must be thread-safe and non-blocking where possible

mod log_display;
mod output_handler;

pub use log_display::LogDisplay;
pub use output_handler::{OutputHandler, OutputStream};
