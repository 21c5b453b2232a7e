//! Nestfsm: a hierarchical finite state machine engine
//!
//! Behavior is modeled as a set of mutually exclusive states, each enterable,
//! updatable on three independent cadences, suspendable and exitable, with
//! transitions gated by a guard evaluated on the candidate target. Machines
//! implement the same contract as the states they hold, so a slot can carry
//! an entire sub-machine.
//!
//! # Core Concepts
//!
//! - **State**: The behavior contract shared by leaves and machines
//! - **Lifecycle**: `Ended`, `Running` or `Suspended`, owned by each machine
//! - **Flat machine**: A keyed registry with exactly one active state
//! - **Composite machine**: Entries with independently tracked lifecycles
//! - **Observer**: Optional side channel for debug introspection
//!
//! All operations run synchronously on the calling thread. Invalid requests
//! are silent no-ops, since most call sites live inside a per-frame loop.
//!
//! # Example
//!
//! ```rust
//! use nestfsm::core::{State, StateExt};
//! use nestfsm::machine::FlatMachine;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Ai {
//!     Idle,
//!     Attack,
//! }
//!
//! struct Behavior;
//!
//! impl State for Behavior {
//!     fn start(&mut self) {}
//!     fn end(&mut self) {}
//! }
//!
//! let has_target = Rc::new(Cell::new(false));
//! let sees_target = Rc::clone(&has_target);
//!
//! let mut ai = FlatMachine::new();
//! ai.add(Ai::Idle, Box::new(Behavior));
//! ai.add(Ai::Attack, Box::new(Behavior.guarded(move || sees_target.get())));
//! ai.start_key(Ai::Idle);
//!
//! ai.change(Ai::Attack);
//! assert_eq!(ai.active_key(), Some(&Ai::Idle));
//!
//! has_target.set(true);
//! ai.change(Ai::Attack);
//! assert_eq!(ai.active_key(), Some(&Ai::Attack));
//! ```

pub mod core;
pub mod machine;
pub mod observe;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use crate::core::{Guard, Lifecycle, State, StateExt, StateKey};
pub use crate::machine::{CompositeMachine, FlatMachine, Machine, MachineConfig, ParamMachine};
pub use crate::observe::{EventLog, MachineEvent, Observer};
