use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

use crate::error::CallbackError;

/// Values handed to callbacks. The loop never inspects them.
pub type Value = serde_json::Value;

/// Bound arguments of a task. Most timer callbacks take a handful of values,
/// so they are kept inline.
pub type Arguments = SmallVec<[Value; 4]>;

pub type CallbackResult = Result<(), CallbackError>;

/// Builds an [`Arguments`] list from anything convertible into a [`Value`].
///
/// ```
/// use drainloop_scheduler::args;
/// let a = args!["a", 42];
/// assert_eq!(a.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    ($($value:expr),+ $(,)?) => {{
        let mut arguments = $crate::Arguments::new();
        $( arguments.push($crate::Value::from($value)); )+
        arguments
    }};
}

/// Anything the loop can invoke with an argument list.
///
/// Implemented for every `FnOnce(&[Value]) -> CallbackResult` closure, so a
/// single abstraction covers callbacks of any arity.
pub trait Callback: Send + 'static {
    fn call(self: Box<Self>, args: &[Value]) -> CallbackResult;

    /// Label used when reporting failures.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Callback for F
where
    F: FnOnce(&[Value]) -> CallbackResult + Send + 'static,
{
    fn call(self: Box<Self>, args: &[Value]) -> CallbackResult {
        (*self)(args)
    }
}

/// Boxes a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Box<dyn Callback>
where
    F: FnOnce(&[Value]) -> CallbackResult + Send + 'static,
{
    Box::new(f)
}

/// One pending unit of work.
pub struct ScheduledTask {
    /// Position in the loop's scheduling order, for diagnostics only.
    pub seq: u64,
    pub callback: Box<dyn Callback>,
    pub arguments: Arguments,
    /// Delay requested by the producer. Recorded, never awaited.
    pub delay: Duration,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("seq", &self.seq)
            .field("callback", &self.callback.name())
            .field("arguments", &self.arguments)
            .field("delay", &self.delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn run_passes_bound_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let task = ScheduledTask {
            seq: 0,
            callback: callback(move |args| {
                sink.lock().unwrap().extend_from_slice(args);
                Ok(())
            }),
            arguments: args!["a", 42],
            delay: Duration::from_millis(1000),
        };

        let ScheduledTask {
            callback, arguments, ..
        } = task;
        assert!(callback.call(&arguments).is_ok());
        assert_eq!(arguments.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![Value::from("a"), Value::from(42)]);
    }

    #[test]
    fn empty_args_macro() {
        let a = args![];
        assert!(a.is_empty());
    }
}
