//! Debug introspection for machines.
//!
//! Machines emit [`MachineEvent`]s to an optional [`Observer`] when states
//! are registered, removed, started, changed or ended. Observation is a
//! side channel: it never feeds back into control flow.

mod event;
mod log;

pub use event::{MachineEvent, MachineId, ObservedEvent, Observer};
pub use log::{EventLog, DEFAULT_LOG_CAPACITY};
