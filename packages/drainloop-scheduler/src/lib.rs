pub mod config;
pub mod diagnostics;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod task;

use std::time::Duration;

/// The timer-scheduling surface that producers program against.
/// Implemented by the loop itself and by its cloneable [`LoopHandle`].
pub trait Scheduler {
    /// Schedule `callback` to run with `args`.
    /// `delay` is recorded but not honoured: the task runs on the next pump.
    fn schedule_timeout(
        &self,
        callback: Box<dyn Callback>,
        delay: Duration,
        args: Arguments,
    ) -> Result<(), ScheduleError>;

    /// Equivalent to `schedule_timeout` with a zero delay.
    fn schedule_immediate(
        &self,
        callback: Box<dyn Callback>,
        args: Arguments,
    ) -> Result<(), ScheduleError> {
        self.schedule_timeout(callback, Duration::ZERO, args)
    }
}

pub use config::LoopConfig;
pub use diagnostics::{DiagnosticSink, RecordingSink, TaskFailure, TracingSink};
pub use error::{CallbackError, ConfigError, EmptyQueueError, ScheduleError};
pub use queue::TaskQueue;
pub use scheduler::{EventLoop, LoopHandle, LoopState, PumpReport};
pub use stats::LoopStats;
pub use task::{Arguments, Callback, CallbackResult, ScheduledTask, Value, callback};
