//! Process supervision runtime for relayctl.
//!
//! Owns everything that touches real OS processes: spawning and stopping
//! the relay server and transcoder workers, capturing their output into the
//! operator log, tracking slots, and cleaning up after crashes.

#![deny(unsafe_code)]

pub mod log;
pub mod monitor;
pub mod orchestrator;
pub mod pidfile;
pub mod process;
pub mod registry;
pub mod relay;

// Re-export the main supervision types
pub use monitor::{DEFAULT_HEALTH_INTERVAL, spawn_health_monitor};
pub use orchestrator::{HealthReport, StartAllReport, StartOutcome, StreamOrchestrator};
pub use registry::{StreamRegistry, StreamSlot};
pub use relay::{Readiness, RelaySupervisor};

// Re-export process primitives
pub use process::{
    OutputFilter, ProcessHandle, ProcessLauncher, SinkOutputHandler, StopOutcome, SystemLauncher,
};

// Re-export log utilities
pub use log::{LogBatch, LogEntry, LogSink, LogView, spawn_log_flusher};

// Orphan cleanup at startup
pub use pidfile::{SweepOutcome, cleanup_orphaned_relay};
