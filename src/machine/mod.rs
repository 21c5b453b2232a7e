//! Machines that own and drive states.
//!
//! - [`FlatMachine`]: one active state, guarded key-based transitions
//! - [`ParamMachine`]: a flat machine with typed entry arguments
//! - [`CompositeMachine`]: independently lifecycled entries, no single active one
//!
//! Every machine also implements [`State`], so any of them can be registered
//! inside another.

mod composite;
mod config;
mod context;
mod flat;
mod param;
mod rejection;

pub use composite::CompositeMachine;
pub use config::MachineConfig;
pub use flat::FlatMachine;
pub use param::ParamMachine;
pub use rejection::{ChangeRejection, TransitionError};

use crate::core::{Lifecycle, State, StateKey};
use std::any::Any;

/// Registry and transition operations shared by every machine kind.
///
/// Lets generic driver code hold any machine behind one interface. The
/// composite machine has no single active slot, so its `start_key`,
/// `change` and `change_with` do nothing.
pub trait Machine<K: StateKey>: State {
    /// Register `state` under `key`, disposing any previous occupant.
    fn add(&mut self, key: K, state: Box<dyn State>);

    /// Remove and dispose the state under `key`.
    fn remove(&mut self, key: &K) -> bool;

    fn get(&self, key: &K) -> Option<&dyn State>;

    fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The machine's own status.
    fn lifecycle(&self) -> Lifecycle;

    fn start_key(&mut self, key: K);

    fn change(&mut self, key: K);

    fn change_with(&mut self, key: K, args: &dyn Any);

    /// End the machine, dispose every registered state and empty the registry.
    fn clear(&mut self);
}
