//! Display collaborator for flushed log batches.

/// Receives batches of operator log lines from the periodic flusher.
///
/// The display owns its own retention policy; the sink never trims.
pub trait LogDisplay: Send + Sync {
    /// Show one flushed batch. Lines are already in arrival order.
    fn show(&self, lines: &[String]);
}
