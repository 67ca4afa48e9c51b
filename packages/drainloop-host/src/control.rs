use drainloop_scheduler::{EventLoop, LoopHandle, LoopStats, PumpReport};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::HostError;

/// The loop-control object exposed to host code: `process` and `reset`.
///
/// Clones share one loop. Pumping takes exclusive ownership of the loop for
/// the duration of the pump; a second pump attempt while one runs fails with
/// [`HostError::PumpInProgress`] instead of blocking.
#[derive(Clone)]
pub struct LoopControl {
    event_loop: Arc<Mutex<EventLoop>>,
    handle: LoopHandle,
}

impl LoopControl {
    pub fn new(event_loop: EventLoop) -> Self {
        let handle = event_loop.handle();
        Self {
            event_loop: Arc::new(Mutex::new(event_loop)),
            handle,
        }
    }

    pub fn process(&self) -> Result<PumpReport, HostError> {
        let mut event_loop = self
            .event_loop
            .try_lock()
            .ok_or(HostError::PumpInProgress)?;
        Ok(event_loop.process())
    }

    /// Discards work not yet popped. Usable from callbacks and other threads
    /// while a pump runs.
    pub fn reset(&self) -> usize {
        self.handle.reset()
    }

    /// Resets the loop only when no pump is running; otherwise the queue is
    /// left untouched and [`HostError::PumpInProgress`] is returned.
    pub fn reset_if_idle(&self) -> Result<usize, HostError> {
        let event_loop = self
            .event_loop
            .try_lock()
            .ok_or(HostError::PumpInProgress)?;
        Ok(event_loop.reset())
    }

    pub fn is_pumping(&self) -> bool {
        self.event_loop.is_locked()
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn stats(&self) -> LoopStats {
        self.handle.stats()
    }

    pub fn shutdown(&self) -> Result<usize, HostError> {
        let mut event_loop = self
            .event_loop
            .try_lock()
            .ok_or(HostError::PumpInProgress)?;
        Ok(event_loop.shutdown())
    }
}

impl std::fmt::Debug for LoopControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopControl")
            .field("handle", &self.handle)
            .finish()
    }
}
