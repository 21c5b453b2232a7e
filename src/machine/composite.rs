//! Machine whose entries run independently of one another.

use super::context::{Cadence, MachineContext};
use super::{Machine, MachineConfig};
use crate::core::{Lifecycle, State, StateKey};
use crate::observe::{MachineEvent, MachineId, Observer};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

struct Entry {
    state: Box<dyn State>,
    status: Lifecycle,
}

impl Entry {
    /// Move the entry to `target`, returning whether anything was called.
    fn drive(&mut self, target: Lifecycle, args: Option<&dyn Any>) -> bool {
        match (self.status, target) {
            (current, target) if current == target => return false,
            (_, Lifecycle::Running) => match args {
                Some(args) => self.state.start_with(args),
                None => self.state.start(),
            },
            (_, Lifecycle::Ended) => self.state.end(),
            (_, Lifecycle::Suspended) => self.state.suspend(),
        }
        self.status = target;
        true
    }
}

/// Machine tracking a lifecycle per entry instead of a single active state.
///
/// Entries are leaves or whole sub-machines, visited in key order. Global
/// [`start`](CompositeMachine::start), [`end`](CompositeMachine::end) and
/// [`suspend`](CompositeMachine::suspend) sweep every entry, skipping those
/// already at the requested status; [`change_entry`](CompositeMachine::change_entry)
/// moves one entry without touching its siblings. Update cadences reach the
/// running entries while the composite itself is running.
///
/// # Example
///
/// ```rust
/// use nestfsm::core::{Lifecycle, State};
/// use nestfsm::machine::CompositeMachine;
///
/// struct Effect;
///
/// impl State for Effect {
///     fn start(&mut self) {}
///     fn end(&mut self) {}
/// }
///
/// let mut effects = CompositeMachine::new();
/// effects.add("burning", Box::new(Effect));
/// effects.add("frozen", Box::new(Effect));
///
/// effects.start();
/// effects.change_entry(&"frozen", Lifecycle::Ended);
///
/// assert_eq!(effects.entry_status(&"burning"), Some(Lifecycle::Running));
/// assert_eq!(effects.entry_status(&"frozen"), Some(Lifecycle::Ended));
/// ```
pub struct CompositeMachine<K: StateKey + Ord> {
    entries: BTreeMap<K, Entry>,
    lifecycle: Lifecycle,
    context: MachineContext<K>,
}

impl<K: StateKey + Ord> Default for CompositeMachine<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StateKey + Ord> CompositeMachine<K> {
    /// Create an empty, ended machine with the default config.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            lifecycle: Lifecycle::Ended,
            context: MachineContext::new(),
        }
    }

    /// Replace the machine config.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.context.set_config(config);
        self
    }

    /// Attach a debug observer, replacing any attached earlier.
    ///
    /// Only the new observer receives the [`MachineEvent::Created`] emitted
    /// here; a replaced observer stops receiving events.
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: Observer<K> + 'static,
    {
        self.context.attach(Box::new(observer));
        self
    }

    /// Identity stamped on every emitted event.
    pub fn id(&self) -> MachineId {
        self.context.id()
    }

    /// Current config.
    pub fn config(&self) -> &MachineConfig {
        self.context.config()
    }

    /// Lifecycle of the machine itself.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// State registered under `key`.
    pub fn get(&self, key: &K) -> Option<&dyn State> {
        self.entries.get(key).map(|entry| &*entry.state)
    }

    /// Tracked status of the entry under `key`.
    pub fn entry_status(&self, key: &K) -> Option<Lifecycle> {
        self.entries.get(key).map(|entry| entry.status)
    }

    /// Returns true if `key` is registered.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in visiting order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Register `state` under `key`.
    ///
    /// The tracked status starts from the state's own reported status, so a
    /// sub-machine that is already running is tracked as running. A previous
    /// occupant is ended (unless already ended) and disposed.
    pub fn add(&mut self, key: K, state: Box<dyn State>) {
        let status = state.status().unwrap_or(Lifecycle::Ended);
        let previous = self.entries.insert(key.clone(), Entry { state, status });

        match previous {
            Some(mut previous) => {
                previous.drive(Lifecycle::Ended, None);
                previous.state.dispose();
                self.context.emit(MachineEvent::StateReplaced { key });
            }
            None => self.context.emit(MachineEvent::StateAdded { key }),
        }
    }

    /// Remove the entry under `key`, ending it unless already ended, then disposing it.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(mut entry) = self.entries.remove(key) else {
            return false;
        };
        entry.drive(Lifecycle::Ended, None);
        entry.state.dispose();
        self.context.emit(MachineEvent::StateRemoved { key: key.clone() });
        true
    }

    /// End every entry, dispose them and empty the registry.
    pub fn clear(&mut self) {
        self.end();
        for (_, entry) in std::mem::take(&mut self.entries) {
            entry.state.dispose();
        }
        self.context.emit(MachineEvent::Cleared);
    }

    /// Run the composite and start every entry not already running.
    pub fn start(&mut self) {
        self.start_all(None);
    }

    /// End the composite and every entry not already ended.
    pub fn end(&mut self) {
        self.sweep(Lifecycle::Ended, None);
        if !self.lifecycle.is_ended() {
            self.lifecycle = Lifecycle::Ended;
            self.context.emit(MachineEvent::Ended { key: None });
        }
    }

    /// Suspend every entry not already suspended.
    pub fn suspend(&mut self) {
        self.sweep(Lifecycle::Suspended, None);
        if self.lifecycle.is_running() {
            self.lifecycle = Lifecycle::Suspended;
            self.context.emit(MachineEvent::Suspended { key: None });
        }
    }

    /// Move the single entry under `key` to `target`, leaving siblings alone.
    ///
    /// Returns `false` when the key is unknown or the entry was already at
    /// `target`.
    pub fn change_entry(&mut self, key: &K, target: Lifecycle) -> bool {
        self.change_entry_inner(key, target, None)
    }

    /// Like [`change_entry`](Self::change_entry) to `Running`, entering with `args`.
    pub fn start_entry_with(&mut self, key: &K, args: &dyn Any) -> bool {
        self.change_entry_inner(key, Lifecycle::Running, Some(args))
    }

    /// Tick the update cadence.
    pub fn update(&mut self) {
        self.tick(Cadence::Update);
    }

    /// Tick the fixed update cadence.
    pub fn fixed_update(&mut self) {
        self.tick(Cadence::FixedUpdate);
    }

    /// Tick the custom update cadence.
    pub fn custom_update(&mut self) {
        self.tick(Cadence::CustomUpdate);
    }

    /// Broadcast `message` to every running entry, in key order.
    pub fn send_message(&mut self, message: &dyn Any) {
        if !self.lifecycle.is_running() {
            return;
        }
        for entry in self.entries.values_mut() {
            if entry.status.is_running() {
                entry.state.send_message(message);
            }
        }
    }

    /// Deliver `message` to the entry under `key` if it is running.
    pub fn send_message_to(&mut self, key: &K, message: &dyn Any) -> bool {
        if !self.lifecycle.is_running() {
            return false;
        }
        match self.entries.get_mut(key) {
            Some(entry) if entry.status.is_running() => {
                entry.state.send_message(message);
                true
            }
            _ => false,
        }
    }

    fn start_all(&mut self, args: Option<&dyn Any>) {
        self.sweep(Lifecycle::Running, args);
        if !self.lifecycle.is_running() {
            self.lifecycle = Lifecycle::Running;
            self.context.emit(MachineEvent::Started { key: None });
        }
    }

    fn sweep(&mut self, target: Lifecycle, args: Option<&dyn Any>) {
        for (key, entry) in self.entries.iter_mut() {
            if entry.drive(target, args) {
                self.context.emit(entry_event(key, target));
            }
        }
    }

    fn change_entry_inner(&mut self, key: &K, target: Lifecycle, args: Option<&dyn Any>) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        let changed = entry.drive(target, args);
        if changed {
            self.context.emit(entry_event(key, target));
        }
        changed
    }

    fn tick(&mut self, cadence: Cadence) {
        if !self.lifecycle.is_running() {
            return;
        }
        self.context.tick(cadence);
        for entry in self.entries.values_mut() {
            if entry.status.is_running() {
                cadence.apply(entry.state.as_mut());
            }
        }
    }
}

fn entry_event<K: Clone>(key: &K, target: Lifecycle) -> MachineEvent<K> {
    let key = Some(key.clone());
    match target {
        Lifecycle::Running => MachineEvent::Started { key },
        Lifecycle::Suspended => MachineEvent::Suspended { key },
        Lifecycle::Ended => MachineEvent::Ended { key },
    }
}

impl<K: StateKey + Ord> fmt::Debug for CompositeMachine<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeMachine")
            .field("context", &self.context)
            .field("lifecycle", &self.lifecycle)
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(key, entry)| (key, entry.status))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<K: StateKey + Ord> State for CompositeMachine<K> {
    fn start(&mut self) {
        Self::start(self);
    }

    fn start_with(&mut self, args: &dyn Any) {
        self.start_all(Some(args));
    }

    fn update(&mut self) {
        Self::update(self);
    }

    fn fixed_update(&mut self) {
        Self::fixed_update(self);
    }

    fn custom_update(&mut self) {
        Self::custom_update(self);
    }

    fn suspend(&mut self) {
        Self::suspend(self);
    }

    fn end(&mut self) {
        Self::end(self);
    }

    fn send_message(&mut self, message: &dyn Any) {
        Self::send_message(self, message);
    }

    fn dispose(mut self: Box<Self>) {
        self.clear();
    }

    fn status(&self) -> Option<Lifecycle> {
        Some(self.lifecycle)
    }
}

/// Single-slot entry points do not apply to a composite and are no-ops.
impl<K: StateKey + Ord> Machine<K> for CompositeMachine<K> {
    fn add(&mut self, key: K, state: Box<dyn State>) {
        Self::add(self, key, state);
    }

    fn remove(&mut self, key: &K) -> bool {
        Self::remove(self, key)
    }

    fn get(&self, key: &K) -> Option<&dyn State> {
        Self::get(self, key)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn start_key(&mut self, _key: K) {}

    fn change(&mut self, _key: K) {}

    fn change_with(&mut self, _key: K, _args: &dyn Any) {}

    fn clear(&mut self) {
        Self::clear(self);
    }
}
