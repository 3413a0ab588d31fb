//! Relay server supervision.

mod readiness;
mod supervisor;

pub use readiness::{DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT, Readiness};
pub use supervisor::RelaySupervisor;
