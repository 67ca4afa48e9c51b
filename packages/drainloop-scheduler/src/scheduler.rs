use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use crate::Scheduler;
use crate::config::LoopConfig;
use crate::diagnostics::{DiagnosticSink, TaskFailure, TracingSink};
use crate::error::{CallbackError, ScheduleError};
use crate::queue::TaskQueue;
use crate::stats::{Counters, LoopStats};
use crate::task::{Arguments, Callback, ScheduledTask};

/// Where a loop currently is in its pump cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    /// About to test the queue for pending work.
    Checking,
    /// Running a popped task.
    Draining,
    Closed,
}

impl LoopState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LoopState::Checking,
            2 => LoopState::Draining,
            _ => LoopState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LoopState::Idle | LoopState::Closed => 0,
            LoopState::Checking => 1,
            LoopState::Draining => 2,
        }
    }
}

/// Outcome of a single call to [`EventLoop::process`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub executed: usize,
    pub failed: usize,
}

struct Shared {
    name: String,
    queue: TaskQueue,
    state: AtomicU8,
    counters: Counters,
}

impl Shared {
    fn schedule(
        &self,
        callback: Box<dyn Callback>,
        delay: Duration,
        arguments: Arguments,
    ) -> Result<(), ScheduleError> {
        let seq = self.queue.enqueue(callback, arguments, delay)?;
        Counters::add(&self.counters.scheduled, 1);
        tracing::trace!(event_loop = %self.name, seq, "task scheduled");
        Ok(())
    }

    fn reset(&self) -> usize {
        let discarded = self.queue.clear();
        Counters::add(&self.counters.discarded, discarded as u64);
        tracing::debug!(event_loop = %self.name, discarded, "event loop reset");
        discarded
    }

    fn state(&self) -> LoopState {
        if self.queue.is_closed() {
            LoopState::Closed
        } else {
            LoopState::from_u8(self.state.load(Ordering::Acquire))
        }
    }

    fn set_state(&self, state: LoopState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn stats(&self) -> LoopStats {
        self.counters
            .snapshot(&self.name, self.queue.size(), self.state())
    }
}

/// Marks a pump in progress and puts the loop back to idle when dropped,
/// including on unwind.
struct PumpGuard<'a>(&'a Shared);

impl<'a> PumpGuard<'a> {
    fn enter(shared: &'a Shared) -> Self {
        shared.set_state(LoopState::Checking);
        Self(shared)
    }
}

impl Drop for PumpGuard<'_> {
    fn drop(&mut self) {
        self.0.set_state(LoopState::Idle);
    }
}

/// A cooperative event loop emulating `setTimeout`/`setImmediate`.
///
/// The loop owns its queue. Work is submitted through [`Scheduler`], either
/// directly or via a [`LoopHandle`] that can be cloned into callbacks and
/// other threads. Only the owner can pump, so there is exactly one consumer
/// and pumping can never re-enter itself.
pub struct EventLoop {
    shared: Arc<Shared>,
    sink: Arc<dyn DiagnosticSink>,
    drain_on_shutdown: bool,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    pub fn with_config(config: LoopConfig) -> Self {
        tracing::debug!(event_loop = %config.name, "event loop created");
        Self {
            shared: Arc::new(Shared {
                queue: TaskQueue::with_capacity(config.queue_capacity),
                name: config.name,
                state: AtomicU8::new(LoopState::Idle.as_u8()),
                counters: Counters::default(),
            }),
            sink: Arc::new(TracingSink),
            drain_on_shutdown: config.drain_on_shutdown,
        }
    }

    /// Replaces the diagnostic sink that receives callback failures.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Pumps the loop until the queue is observed empty.
    ///
    /// Tasks scheduled while the pump runs, by a callback or by another
    /// thread, are drained by this same call. A failing callback is reported
    /// to the sink and never stops the pump.
    pub fn process(&mut self) -> PumpReport {
        let mut report = PumpReport::default();
        if self.shared.queue.is_closed() {
            return report;
        }
        Counters::add(&self.shared.counters.pumps, 1);

        let pump = PumpGuard::enter(&self.shared);
        while let Some(task) = self.shared.queue.pop() {
            self.shared.set_state(LoopState::Draining);
            report.executed += 1;
            if !self.run_task(task) {
                report.failed += 1;
                Counters::add(&self.shared.counters.failed, 1);
            }
            Counters::add(&self.shared.counters.executed, 1);
            self.shared.set_state(LoopState::Checking);
        }
        drop(pump);

        if report.executed > 0 {
            tracing::debug!(
                event_loop = %self.shared.name,
                executed = report.executed,
                failed = report.failed,
                "pump finished"
            );
        }
        report
    }

    fn run_task(&self, task: ScheduledTask) -> bool {
        let ScheduledTask {
            seq,
            callback,
            arguments,
            delay,
        } = task;
        let name = callback.name();
        tracing::trace!(
            event_loop = %self.shared.name,
            seq,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "running task"
        );

        let error = match panic::catch_unwind(AssertUnwindSafe(|| callback.call(&arguments))) {
            Ok(Ok(())) => return true,
            Ok(Err(error)) => error,
            Err(payload) => CallbackError::from_panic(payload),
        };

        let failure = TaskFailure {
            loop_name: self.shared.name.clone(),
            seq,
            callback: name,
            arguments,
            error,
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.sink.report(&failure))) {
            tracing::error!(
                event_loop = %self.shared.name,
                seq,
                sink_error = %CallbackError::from_panic(payload),
                "diagnostic sink panicked while reporting a task failure"
            );
        }
        false
    }

    /// Discards every task that has not been popped yet.
    ///
    /// A task that is already running completes, and anything scheduled after
    /// the reset is kept.
    pub fn reset(&self) -> usize {
        self.shared.reset()
    }

    pub fn pending(&self) -> usize {
        self.shared.queue.size()
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    pub fn stats(&self) -> LoopStats {
        self.shared.stats()
    }

    /// Closes the queue. Pending tasks are discarded and handles can no
    /// longer schedule. Returns the number of discarded tasks.
    pub fn close(&mut self) -> usize {
        let discarded = self.shared.queue.close();
        Counters::add(&self.shared.counters.discarded, discarded as u64);
        discarded
    }

    /// Ends the loop's lifecycle, draining first when configured to.
    /// Afterwards the loop is inert: pumps do nothing and scheduling fails.
    pub fn shutdown(&mut self) -> usize {
        if self.shared.queue.is_closed() {
            return 0;
        }
        if self.drain_on_shutdown {
            self.process();
        }
        let discarded = self.close();
        tracing::info!(event_loop = %self.shared.name, discarded, "event loop shut down");
        discarded
    }
}

impl Scheduler for EventLoop {
    fn schedule_timeout(
        &self,
        callback: Box<dyn Callback>,
        delay: Duration,
        args: Arguments,
    ) -> Result<(), ScheduleError> {
        self.shared.schedule(callback, delay, args)
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        if !self.shared.queue.is_closed() {
            let discarded = self.close();
            tracing::debug!(event_loop = %self.shared.name, discarded, "event loop dropped");
        }
    }
}

/// Producer side of an [`EventLoop`]. Cheap to clone, usable from any thread
/// and from inside running callbacks.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Arc<Shared>,
}

impl LoopHandle {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Same policy as [`EventLoop::reset`]; safe to call while a pump runs.
    pub fn reset(&self) -> usize {
        self.shared.reset()
    }

    pub fn pending(&self) -> usize {
        self.shared.queue.size()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.queue.is_closed()
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    pub fn stats(&self) -> LoopStats {
        self.shared.stats()
    }
}

impl Scheduler for LoopHandle {
    fn schedule_timeout(
        &self,
        callback: Box<dyn Callback>,
        delay: Duration,
        args: Arguments,
    ) -> Result<(), ScheduleError> {
        self.shared.schedule(callback, delay, args)
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("name", &self.shared.name)
            .field("pending", &self.shared.queue.size())
            .finish()
    }
}
