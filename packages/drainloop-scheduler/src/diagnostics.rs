use parking_lot::Mutex;

use crate::error::CallbackError;
use crate::task::Arguments;

/// Everything known about a callback that failed during a pump.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub loop_name: String,
    pub seq: u64,
    pub callback: &'static str,
    pub arguments: Arguments,
    pub error: CallbackError,
}

/// Receives callback failures. The pump reports and moves on; a sink never
/// influences whether later tasks run.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, failure: &TaskFailure);
}

/// Default sink: one `error` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, failure: &TaskFailure) {
        tracing::error!(
            event_loop = %failure.loop_name,
            seq = failure.seq,
            callback = failure.callback,
            arguments = ?failure.arguments,
            error = %failure.error,
            "scheduled callback failed"
        );
    }
}

/// Keeps failures in memory for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    failures: Mutex<Vec<TaskFailure>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<TaskFailure> {
        self.failures.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.lock().is_empty()
    }

    pub fn take(&self) -> Vec<TaskFailure> {
        std::mem::take(&mut *self.failures.lock())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, failure: &TaskFailure) {
        tracing::debug!(seq = failure.seq, error = %failure.error, "recording callback failure");
        self.failures.lock().push(failure.clone());
    }
}
