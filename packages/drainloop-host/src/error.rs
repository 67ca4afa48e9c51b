use drainloop_scheduler::{ScheduleError, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    /// `process` was called while another pump holds the loop, either from
    /// another thread or re-entrantly from inside a callback.
    #[error("event loop is already being pumped")]
    PumpInProgress,
    #[error("no global named `{0}` is installed")]
    UnknownGlobal(String),
    #[error("deferred result was not settled after pumping the event loop")]
    Unsettled,
    #[error("deferred result was rejected: {0}")]
    Rejected(Value),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
