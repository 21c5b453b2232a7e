//! Introspection events emitted by machines.

use crate::core::Lifecycle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identity of a machine instance, used to tell nested machines apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that happened inside a machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent<K> {
    /// An observer was attached to a freshly constructed machine.
    Created,
    /// A key was registered into an empty slot.
    StateAdded { key: K },
    /// A key was registered over a previous occupant, which was torn down.
    StateReplaced { key: K },
    /// A key was removed and its state torn down.
    StateRemoved { key: K },
    /// The machine (or a composite entry) entered `Running`.
    Started { key: Option<K> },
    /// The active state changed.
    Transitioned { from: Option<K>, to: K },
    /// The machine (or a composite entry) was suspended.
    Suspended { key: Option<K> },
    /// The machine (or a composite entry) ended.
    Ended { key: Option<K> },
    /// The registry was emptied.
    Cleared,
}

impl<K> MachineEvent<K> {
    /// Lifecycle implied by this event, if it is a lifecycle event.
    pub fn lifecycle(&self) -> Option<Lifecycle> {
        match self {
            Self::Started { .. } | Self::Transitioned { .. } => Some(Lifecycle::Running),
            Self::Suspended { .. } => Some(Lifecycle::Suspended),
            Self::Ended { .. } => Some(Lifecycle::Ended),
            _ => None,
        }
    }
}

/// An event stamped with its source machine and time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObservedEvent<K> {
    pub machine: MachineId,
    pub timestamp: DateTime<Utc>,
    pub event: MachineEvent<K>,
}

/// Side-channel receiver of machine events.
///
/// Observers are notified after the machine has already acted and cannot
/// influence control flow.
pub trait Observer<K> {
    fn on_event(&mut self, event: &ObservedEvent<K>);
}

impl<K, O: Observer<K>> Observer<K> for Rc<RefCell<O>> {
    fn on_event(&mut self, event: &ObservedEvent<K>) {
        self.borrow_mut().on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_ids_are_unique() {
        assert_ne!(MachineId::new(), MachineId::new());
    }

    #[test]
    fn machine_id_displays_as_its_uuid() {
        let id = MachineId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn lifecycle_events_map_to_status() {
        let started: MachineEvent<u8> = MachineEvent::Started { key: Some(1) };
        let moved: MachineEvent<u8> = MachineEvent::Transitioned { from: None, to: 2 };
        let added: MachineEvent<u8> = MachineEvent::StateAdded { key: 3 };

        assert_eq!(started.lifecycle(), Some(Lifecycle::Running));
        assert_eq!(moved.lifecycle(), Some(Lifecycle::Running));
        assert_eq!(MachineEvent::<u8>::Ended { key: None }.lifecycle(), Some(Lifecycle::Ended));
        assert_eq!(added.lifecycle(), None);
    }
}
