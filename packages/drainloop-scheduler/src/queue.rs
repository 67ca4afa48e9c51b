use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{EmptyQueueError, ScheduleError};
use crate::task::{Arguments, Callback, ScheduledTask};

/// A FIFO queue for tasks, shared between producer threads and the single
/// consumer that drains it.
///
/// Every operation takes the same lock, so a size check and the pop that
/// follows it can never interleave with a producer's append.
pub struct TaskQueue {
    inner: Mutex<Inner>,
}

struct Inner {
    tasks: VecDeque<ScheduledTask>,
    next_seq: u64,
    closed: bool,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tasks: VecDeque::with_capacity(capacity),
                next_seq: 0,
                closed: false,
            }),
        }
    }

    /// Appends a task to the tail and returns its sequence number.
    pub fn enqueue(
        &self,
        callback: Box<dyn Callback>,
        arguments: Arguments,
        delay: Duration,
    ) -> Result<u64, ScheduleError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(ScheduleError::Closed);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.tasks.push_back(ScheduledTask {
            seq,
            callback,
            arguments,
            delay,
        });
        Ok(seq)
    }

    /// Removes the head if there is one. The emptiness check and the removal
    /// happen under one lock acquisition.
    pub fn pop(&self) -> Option<ScheduledTask> {
        self.inner.lock().tasks.pop_front()
    }

    pub fn dequeue_front(&self) -> Result<ScheduledTask, EmptyQueueError> {
        self.pop().ok_or(EmptyQueueError)
    }

    pub fn size(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().tasks.is_empty()
    }

    /// Discards every pending task without running it. Returns how many were
    /// dropped.
    pub fn clear(&self) -> usize {
        // Callbacks may own values with arbitrary Drop impls; release them
        // after the lock is gone.
        let discarded = std::mem::take(&mut self.inner.lock().tasks);
        discarded.len()
    }

    /// Clears the queue and refuses any further appends.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            std::mem::take(&mut inner.tasks)
        };
        discarded.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
