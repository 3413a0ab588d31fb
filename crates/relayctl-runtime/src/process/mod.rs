//! Process management primitives.
//!
//! # Structure
//!
//! - `ProcessHandle` - One spawned child with captured stdout/stderr
//! - `ProcessLauncher` - Port through which every spawn goes
//! - `OutputFilter` / `SinkOutputHandler` - Route captured lines to the log
//! - `kill_pid` - Terminate a process we only know by PID (orphan cleanup)

mod filter;
mod handle;
mod launcher;
pub mod shutdown;
mod stream;

pub use filter::{OutputFilter, SinkOutputHandler};
pub use handle::{ProcessHandle, StopOutcome};
pub use launcher::{ProcessLauncher, SystemLauncher};
pub use shutdown::kill_pid;
pub(crate) use stream::spawn_stream_reader;
