//! Bounded in-memory log of observed machine events.

use super::event::{MachineEvent, ObservedEvent, Observer};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of events retained by [`EventLog::new`].
pub const DEFAULT_LOG_CAPACITY: usize = 256;

/// Ordered record of events received from one or more machines.
///
/// When full, the oldest event is dropped to make room.
///
/// # Example
///
/// ```rust
/// use nestfsm::machine::FlatMachine;
/// use nestfsm::observe::EventLog;
/// use nestfsm::core::State;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// struct Idle;
///
/// impl State for Idle {
///     fn start(&mut self) {}
///     fn end(&mut self) {}
/// }
///
/// let log = Rc::new(RefCell::new(EventLog::new()));
/// let mut machine = FlatMachine::new().with_observer(Rc::clone(&log));
/// machine.add("idle", Box::new(Idle));
/// machine.start();
///
/// assert_eq!(log.borrow().len(), 3); // created, added, started
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(
    from = "StoredLog<K>",
    bound(deserialize = "K: Deserialize<'de>")
)]
pub struct EventLog<K> {
    capacity: usize,
    events: VecDeque<ObservedEvent<K>>,
}

/// Serialized form of an [`EventLog`], bounded again on load.
#[derive(Deserialize)]
struct StoredLog<K> {
    capacity: usize,
    events: VecDeque<ObservedEvent<K>>,
}

impl<K> From<StoredLog<K>> for EventLog<K> {
    fn from(stored: StoredLog<K>) -> Self {
        let mut log = Self {
            capacity: stored.capacity.max(1),
            events: stored.events,
        };
        log.evict(log.capacity);
        log
    }
}

impl<K> Default for EventLog<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EventLog<K> {
    /// Create an empty log holding up to [`DEFAULT_LOG_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Create an empty log holding up to `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
        }
    }

    /// Append `event`, dropping the oldest events beyond capacity.
    pub fn record(&mut self, event: ObservedEvent<K>) {
        self.evict(self.capacity.saturating_sub(1));
        self.events.push_back(event);
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &ObservedEvent<K>> {
        self.events.iter()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of retained events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every retained event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn evict(&mut self, keep: usize) {
        while self.events.len() > keep {
            self.events.pop_front();
        }
    }

    /// Keys the machine moved through, in order.
    ///
    /// Starts with the origin of the first recorded transition, followed by
    /// the target of each transition.
    pub fn transition_path(&self) -> Vec<&K> {
        let mut path = Vec::new();
        for observed in &self.events {
            if let MachineEvent::Transitioned { from, to } = &observed.event {
                if path.is_empty() {
                    if let Some(from) = from {
                        path.push(from);
                    }
                }
                path.push(to);
            }
        }
        path
    }

    /// Time between the oldest and newest retained events.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.events.front()?, self.events.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}

impl<K: Clone> Observer<K> for EventLog<K> {
    fn on_event(&mut self, event: &ObservedEvent<K>) {
        self.record(event.clone());
    }
}
