//! Observability hooks for a running scan.
//!
//! Sinks only observe: the coordinator never waits on them and their timing or
//! formatting has no effect on results.

use crate::batch::ScanSummary;
use crate::probe::{AttemptEvent, ProbeOutcome};

pub type ProgressCallback = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

pub trait ProgressSink: Send + Sync {
    fn on_start(&self, _total: usize) {}

    /// Called after every attempt, including retries.
    fn on_attempt(&self, _event: &AttemptEvent<'_>) {}

    /// Called once per hostname as its probe finishes, in completion order.
    fn on_probe_complete(&self, _completed: usize, _total: usize, _outcome: &ProbeOutcome) {}

    fn on_finish(&self, _summary: &ScanSummary) {}
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {}

/// Adapts a plain `(completed, total, hostname)` callback.
pub struct CallbackProgress {
    callback: ProgressCallback,
}

impl CallbackProgress {
    pub fn new(callback: ProgressCallback) -> Self {
        Self { callback }
    }
}

impl ProgressSink for CallbackProgress {
    fn on_probe_complete(&self, completed: usize, total: usize, outcome: &ProbeOutcome) {
        (self.callback)(completed, total, &outcome.hostname);
    }
}
