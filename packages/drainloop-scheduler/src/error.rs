use std::any::Any;

use thiserror::Error;

/// Returned by [`TaskQueue::dequeue_front`](crate::TaskQueue::dequeue_front)
/// when the queue holds no tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("attempted to dequeue from an empty task queue")]
pub struct EmptyQueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The loop was shut down; no further work is accepted.
    #[error("event loop is closed")]
    Closed,
}

/// A failure raised by a scheduled callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("{0}")]
    Failed(String),
    #[error("callback panicked: {0}")]
    Panicked(String),
}

impl CallbackError {
    pub fn msg(message: impl Into<String>) -> Self {
        CallbackError::Failed(message.into())
    }

    /// Converts a payload captured by `catch_unwind` into an error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        CallbackError::Panicked(message)
    }
}

impl From<ScheduleError> for CallbackError {
    fn from(err: ScheduleError) -> Self {
        CallbackError::Failed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid loop configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("loop name must not be empty")]
    EmptyName,
}
