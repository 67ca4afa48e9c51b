pub mod bindings;
pub mod control;
pub mod deferred;
pub mod error;
pub mod session;

pub use bindings::{
    EVENT_LOOP, GlobalScope, Globals, SET_IMMEDIATE, SET_TIMEOUT, TimerFunction, install,
};
pub use control::LoopControl;
pub use deferred::{Deferred, Resolver};
pub use error::HostError;
pub use session::HostSession;
