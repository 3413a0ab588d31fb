//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: it renders snapshots and reports handed to
//! it and never calls into the orchestrator.

pub mod slot_table;
pub mod tables;

// Re-export commonly used items
pub use slot_table::{format_start_report, print_slots};
pub use tables::{print_separator, truncate_string};
