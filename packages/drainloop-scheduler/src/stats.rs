use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scheduler::LoopState;

#[derive(Default)]
pub(crate) struct Counters {
    pub scheduled: AtomicU64,
    pub executed: AtomicU64,
    pub failed: AtomicU64,
    pub discarded: AtomicU64,
    pub pumps: AtomicU64,
}

impl Counters {
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, name: &str, pending: usize, state: LoopState) -> LoopStats {
        LoopStats {
            name: name.to_string(),
            state,
            pending,
            scheduled: self.scheduled.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            pumps: self.pumps.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a loop's activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub name: String,
    pub state: LoopState,
    pub pending: usize,
    pub scheduled: u64,
    /// Tasks run to completion, failed ones included.
    pub executed: u64,
    pub failed: u64,
    pub discarded: u64,
    pub pumps: u64,
}

impl LoopStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
