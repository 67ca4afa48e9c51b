//! Timer globals installed into a host's global scope.
//!
//! Hosts without native timers get `setTimeout` and `setImmediate` functions
//! that feed the event loop, plus the loop-control object under
//! [`EVENT_LOOP`] so driver code can pump and reset the loop.

use drainloop_scheduler::{Arguments, Callback, ScheduleError, Scheduler, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::control::LoopControl;
use crate::error::HostError;

pub const SET_TIMEOUT: &str = "setTimeout";
pub const SET_IMMEDIATE: &str = "setImmediate";
pub const EVENT_LOOP: &str = "eventLoop";

/// A timer function as the host sees it: a callback plus the raw argument
/// list of the call. For `setTimeout` the first argument is the delay.
pub type TimerFunction =
    Arc<dyn Fn(Box<dyn Callback>, Arguments) -> Result<(), ScheduleError> + Send + Sync>;

/// The part of a host's global object the timer facility writes into.
pub trait GlobalScope {
    fn define_function(&mut self, name: &str, function: TimerFunction);
    fn define_control(&mut self, name: &str, control: LoopControl);
}

/// Registers the timer functions and the loop-control object.
pub fn install<G: GlobalScope + ?Sized>(scope: &mut G, control: &LoopControl) {
    let handle = control.handle();
    let timeout_handle = handle.clone();
    scope.define_function(
        SET_TIMEOUT,
        Arc::new(move |callback: Box<dyn Callback>, mut args: Arguments| {
            let delay = if args.is_empty() {
                Duration::ZERO
            } else {
                delay_from_value(&args.remove(0))
            };
            timeout_handle.schedule_timeout(callback, delay, args)
        }),
    );
    scope.define_function(
        SET_IMMEDIATE,
        Arc::new(move |callback: Box<dyn Callback>, args: Arguments| {
            handle.schedule_immediate(callback, args)
        }),
    );
    scope.define_control(EVENT_LOOP, control.clone());
    tracing::debug!(
        event_loop = control.handle().name(),
        "timer globals installed"
    );
}

/// Interprets a host value as a delay in milliseconds. Anything that is not
/// a positive finite number means no delay.
pub fn delay_from_value(value: &Value) -> Duration {
    match value.as_f64() {
        Some(ms) if ms.is_finite() && ms > 0.0 => {
            Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
        }
        _ => Duration::ZERO,
    }
}

/// In-memory global scope.
#[derive(Default, Clone)]
pub struct Globals {
    functions: HashMap<String, TimerFunction>,
    controls: HashMap<String, LoopControl>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&TimerFunction> {
        self.functions.get(name)
    }

    pub fn control(&self, name: &str) -> Option<&LoopControl> {
        self.controls.get(name)
    }

    /// Invokes a registered timer function by name.
    pub fn call(
        &self,
        name: &str,
        callback: Box<dyn Callback>,
        args: Arguments,
    ) -> Result<(), HostError> {
        let function = self
            .function(name)
            .ok_or_else(|| HostError::UnknownGlobal(name.to_string()))?;
        function(callback, args)?;
        Ok(())
    }
}

impl GlobalScope for Globals {
    fn define_function(&mut self, name: &str, function: TimerFunction) {
        self.functions.insert(name.to_string(), function);
    }

    fn define_control(&mut self, name: &str, control: LoopControl) {
        self.controls.insert(name.to_string(), control);
    }
}
