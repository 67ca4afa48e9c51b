use drainloop_scheduler::Value;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::control::LoopControl;
use crate::error::HostError;

type Slot<T> = Arc<Mutex<Option<Result<T, Value>>>>;

/// The outcome of asynchronous host work, settled by a [`Resolver`] from a
/// scheduled callback.
///
/// Nothing runs until [`Deferred::wait`] pumps the loop, so work submitted
/// by the driver and everything it schedules in turn executes on the caller's
/// thread during `wait`.
pub struct Deferred<T> {
    slot: Slot<T>,
    control: LoopControl,
}

/// Settles a [`Deferred`]. Only the first settlement counts.
pub struct Resolver<T> {
    slot: Slot<T>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Deferred<T> {
    pub fn new(control: &LoopControl) -> (Self, Resolver<T>) {
        let slot: Slot<T> = Arc::new(Mutex::new(None));
        (
            Self {
                slot: slot.clone(),
                control: control.clone(),
            },
            Resolver { slot },
        )
    }

    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Pumps the loop to quiescence and returns the settled outcome.
    pub fn wait(self) -> Result<T, HostError> {
        self.control.process()?;
        match self.slot.lock().take() {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(HostError::Rejected(reason)),
            None => Err(HostError::Unsettled),
        }
    }
}

impl<T> Resolver<T> {
    /// Returns `false` if the deferred was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    pub fn reject(&self, reason: impl Into<Value>) -> bool {
        self.settle(Err(reason.into()))
    }

    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn settle(&self, outcome: Result<T, Value>) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            tracing::trace!("ignoring second settlement of a deferred result");
            return false;
        }
        *slot = Some(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainloop_scheduler::{EventLoop, Scheduler, args, callback};

    #[test]
    fn resolves_through_a_scheduled_callback() {
        let control = LoopControl::new(EventLoop::new());
        let (deferred, resolver) = Deferred::new(&control);

        control
            .handle()
            .schedule_immediate(
                callback(move |args| {
                    resolver.resolve(args[0].as_i64().unwrap_or_default() * 2);
                    Ok(())
                }),
                args![21],
            )
            .unwrap();

        assert!(!deferred.is_settled());
        assert_eq!(deferred.wait().unwrap(), 42);
    }

    #[test]
    fn first_settlement_wins() {
        let control = LoopControl::new(EventLoop::new());
        let (deferred, resolver) = Deferred::<u8>::new(&control);

        assert!(resolver.reject("nope"));
        assert!(!resolver.resolve(1));
        assert!(resolver.is_settled());

        let err = deferred.wait().unwrap_err();
        assert!(matches!(err, HostError::Rejected(reason) if reason == "nope"));
    }

    #[test]
    fn unsettled_after_pump_is_an_error() {
        let control = LoopControl::new(EventLoop::new());
        let (deferred, _resolver) = Deferred::<()>::new(&control);

        assert!(matches!(deferred.wait(), Err(HostError::Unsettled)));
    }
}
