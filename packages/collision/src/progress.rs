//! Progress reporting for collision loading.
//!
//! The loader only knows about rows read; how that is shown (a terminal
//! progress bar, nothing at all) is up to the caller.

use std::sync::Arc;

/// Receives progress updates while collision rows are read.
pub trait ProgressCallback: Send + Sync {
    /// Sets the expected number of units, when it is known.
    fn set_total(&self, total: u64);

    /// Advances by `delta` units.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the work as done.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
