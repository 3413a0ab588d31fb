//! Relay PID file tracking and startup orphan cleanup.
//!
//! The relay's PID is recorded while it runs so that a relay left behind by a
//! crashed session can be found and killed on the next start.

mod io;
mod sweep;
mod verify;

pub use io::{RelayPidFile, delete_pidfile, read_pidfile, write_pidfile};
pub use sweep::{SweepOutcome, cleanup_orphaned_relay};
pub use verify::{is_relay_process, pid_exists};
