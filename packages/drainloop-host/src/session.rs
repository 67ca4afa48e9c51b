use drainloop_scheduler::{DiagnosticSink, EventLoop, LoopConfig, LoopHandle, ScheduleError};
use std::sync::Arc;
use std::time::Instant;

use crate::bindings::{self, Globals};
use crate::control::LoopControl;
use crate::deferred::{Deferred, Resolver};
use crate::error::HostError;

/// One logical host context: an event loop plus the globals that expose it.
///
/// Independent evaluations share the session; [`HostSession::run`] resets the
/// loop before each one so stale work from an earlier run never leaks into
/// the next.
pub struct HostSession {
    globals: Globals,
    control: LoopControl,
}

impl HostSession {
    pub fn new(config: LoopConfig) -> Self {
        Self::from_loop(EventLoop::with_config(config))
    }

    pub fn with_sink(config: LoopConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::from_loop(EventLoop::with_config(config).with_sink(sink))
    }

    fn from_loop(event_loop: EventLoop) -> Self {
        let started = Instant::now();
        let control = LoopControl::new(event_loop);
        let mut globals = Globals::new();
        bindings::install(&mut globals, &control);
        tracing::info!(
            event_loop = control.handle().name(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "host session started"
        );
        Self { globals, control }
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn control(&self) -> &LoopControl {
        &self.control
    }

    pub fn handle(&self) -> LoopHandle {
        self.control.handle()
    }

    /// Runs one independent unit of host work to completion.
    ///
    /// The loop is reset, `submit` schedules the work and receives the
    /// resolver for its result, then the loop is pumped until quiescent.
    ///
    /// Calling `run` while the loop is being pumped, for example from inside
    /// a callback, fails with [`HostError::PumpInProgress`] and leaves the
    /// queue as it was.
    pub fn run<T, F>(&self, label: &str, submit: F) -> Result<T, HostError>
    where
        F: FnOnce(&LoopHandle, Resolver<T>) -> Result<(), ScheduleError>,
    {
        let started = Instant::now();
        let stale = self.control.reset_if_idle().inspect_err(|err| {
            tracing::warn!(run = label, error = %err, "run refused");
        })?;
        if stale > 0 {
            tracing::warn!(
                run = label,
                discarded = stale,
                "discarded work left over from a previous run"
            );
        }

        let (deferred, resolver) = Deferred::new(&self.control);
        submit(&self.control.handle(), resolver)?;
        let result = deferred.wait();

        match &result {
            Ok(_) => tracing::info!(
                run = label,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "run completed"
            ),
            Err(err) => tracing::warn!(run = label, error = %err, "run failed"),
        }
        result
    }

    pub fn shutdown(self) -> Result<usize, HostError> {
        self.control.shutdown()
    }
}
