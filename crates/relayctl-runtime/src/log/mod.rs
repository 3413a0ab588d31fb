//! Operator log pipeline.
//!
//! Pipe reader tasks and the orchestrator append lines to a [`LogSink`]
//! without blocking. A single flusher task drains the sink periodically,
//! mirrors each batch into the log file and hands it to a
//! [`LogDisplay`](relayctl_core::LogDisplay) such as [`LogView`].

mod flusher;
mod sink;
mod view;

pub use flusher::spawn_log_flusher;
pub use sink::{LogBatch, LogEntry, LogSink};
pub use view::LogView;
