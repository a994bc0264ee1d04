//! Progress reporting for the pipeline stages.
//!
//! [`ProgressCallback`] decouples stage progress from any rendering
//! backend. The CLI renders it with `indicatif`; library callers and tests
//! use [`NullProgress`].

use std::sync::Arc;

/// Receives stage-level progress from the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of stages.
    fn set_total(&self, total: u64);

    /// Advance by `delta` stages.
    fn inc(&self, delta: u64);

    /// Update the label of the stage currently running.
    fn set_message(&self, msg: String);

    /// Mark the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
