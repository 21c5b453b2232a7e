//! Machine with a single active state.

use super::context::{Cadence, MachineContext};
use super::rejection::{ChangeRejection, TransitionError};
use super::{Machine, MachineConfig};
use crate::core::{Lifecycle, State, StateKey};
use crate::observe::{MachineEvent, MachineId, Observer};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Registry of keyed states with at most one active at a time.
///
/// The active pointer is a key into the registry. It is set by the first
/// [`add`](FlatMachine::add) into an empty registry, by
/// [`start_key`](FlatMachine::start_key) and by successful transitions, and is
/// cleared only when the active state is removed or the registry cleared.
/// [`end`](FlatMachine::end) keeps it so the last active state stays
/// inspectable.
///
/// Invalid requests are silent no-ops; use
/// [`try_change`](FlatMachine::try_change) to learn why a transition was
/// refused.
///
/// # Example
///
/// ```rust
/// use nestfsm::core::{Lifecycle, State};
/// use nestfsm::machine::FlatMachine;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Mode {
///     Menu,
///     Playing,
/// }
///
/// struct Screen;
///
/// impl State for Screen {
///     fn start(&mut self) {}
///     fn end(&mut self) {}
/// }
///
/// let mut machine = FlatMachine::new();
/// machine.add(Mode::Menu, Box::new(Screen));
/// machine.add(Mode::Playing, Box::new(Screen));
///
/// machine.start();
/// assert_eq!(machine.lifecycle(), Lifecycle::Running);
/// assert_eq!(machine.active_key(), Some(&Mode::Menu));
///
/// machine.change(Mode::Playing);
/// assert_eq!(machine.active_key(), Some(&Mode::Playing));
/// ```
pub struct FlatMachine<K: StateKey> {
    states: HashMap<K, Box<dyn State>>,
    active: Option<K>,
    lifecycle: Lifecycle,
    context: MachineContext<K>,
}

impl<K: StateKey> Default for FlatMachine<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StateKey> FlatMachine<K> {
    /// Create an empty, ended machine with the default config.
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            active: None,
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

    /// Key of the active state or start candidate.
    pub fn active_key(&self) -> Option<&K> {
        self.active.as_ref()
    }

    /// The active state or start candidate.
    pub fn active(&self) -> Option<&dyn State> {
        self.active.as_ref().and_then(|key| self.get(key))
    }

    /// State registered under `key`.
    pub fn get(&self, key: &K) -> Option<&dyn State> {
        self.states.get(key).map(|state| &**state)
    }

    /// Returns true if `key` is registered.
    pub fn contains(&self, key: &K) -> bool {
        self.states.contains_key(key)
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.states.keys()
    }

    /// Register `state` under `key`.
    ///
    /// A previous occupant is ended (when it is the active state) and
    /// disposed. The first state added to an empty registry becomes the start
    /// candidate without being started.
    pub fn add(&mut self, key: K, state: Box<dyn State>) {
        if self.states.contains_key(&key) {
            if self.active.as_ref() == Some(&key) {
                self.end();
            }
            if let Some(previous) = self.states.insert(key.clone(), state) {
                previous.dispose();
            }
            self.context.emit(MachineEvent::StateReplaced { key });
            return;
        }

        if self.states.is_empty() {
            self.active = Some(key.clone());
        }
        self.states.insert(key.clone(), state);
        self.context.emit(MachineEvent::StateAdded { key });
    }

    /// Remove and dispose the state under `key`.
    ///
    /// Removing the active state ends the machine and clears the active
    /// pointer. Returns `false` if nothing was registered under `key`.
    pub fn remove(&mut self, key: &K) -> bool {
        if !self.states.contains_key(key) {
            return false;
        }
        if self.active.as_ref() == Some(key) {
            self.end();
            self.active = None;
        }
        if let Some(state) = self.states.remove(key) {
            state.dispose();
        }
        self.context.emit(MachineEvent::StateRemoved { key: key.clone() });
        true
    }

    /// End the machine, dispose every state and empty the registry.
    pub fn clear(&mut self) {
        self.end();
        self.active = None;
        for (_, state) in self.states.drain() {
            state.dispose();
        }
        self.context.emit(MachineEvent::Cleared);
    }

    /// Start (or resume) the current candidate. No-op while running.
    pub fn start(&mut self) {
        self.resume(None);
    }

    /// Start the state under `key`, making it active. No-op while running.
    pub fn start_key(&mut self, key: K) {
        self.launch(key, None);
    }

    /// Transition to `key`. Silently ignored when refused.
    pub fn change(&mut self, key: K) {
        // Refusals are reported through try_change and logged there.
        let _ = self.transition(key, None);
    }

    /// Transition to `key`, entering it with `args`. Silently ignored when refused.
    pub fn change_with(&mut self, key: K, args: &dyn Any) {
        let _ = self.transition(key, Some(args));
    }

    /// Transition to `key`, reporting why the request was refused.
    pub fn try_change(&mut self, key: K) -> Result<(), TransitionError> {
        self.transition(key, None)
    }

    /// Like [`try_change`](Self::try_change), entering the target with `args`.
    pub fn try_change_with(&mut self, key: K, args: &dyn Any) -> Result<(), TransitionError> {
        self.transition(key, Some(args))
    }

    /// Check whether a transition to `key` would be applied.
    ///
    /// Accumulates every failing precondition. The target's guard is consulted
    /// last, and only once the machine is running and the target is a
    /// registered, inactive state.
    pub fn validate_change(&self, key: &K) -> Validation<(), NonEmptyVec<ChangeRejection>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ChangeRejection>>> = Vec::new();

        let running = if self.lifecycle.is_running() {
            Validation::success(())
        } else {
            Validation::fail(ChangeRejection::NotRunning {
                lifecycle: self.lifecycle,
            })
        };
        checks.push(running);

        let target = match self.states.get(key) {
            None => Validation::fail(ChangeRejection::unknown_key(key)),
            Some(_) if self.active.as_ref() == Some(key) => {
                Validation::fail(ChangeRejection::already_active(key))
            }
            Some(state) if self.lifecycle.is_running() && !state.condition() => {
                Validation::fail(ChangeRejection::guard_rejected(key))
            }
            Some(_) => Validation::success(()),
        };
        checks.push(target);

        Validation::all_vec(checks).map(|_| ())
    }

    /// Pause the active state. Only meaningful while running.
    pub fn suspend(&mut self) {
        if !self.lifecycle.is_running() {
            return;
        }
        self.lifecycle = Lifecycle::Suspended;
        if let Some(state) = self.active_mut() {
            state.suspend();
        }
        self.context.emit(MachineEvent::Suspended {
            key: self.active.clone(),
        });
    }

    /// End the active state. The active pointer is kept.
    pub fn end(&mut self) {
        if self.lifecycle.is_ended() {
            return;
        }
        self.lifecycle = Lifecycle::Ended;
        if let Some(state) = self.active_mut() {
            state.end();
        }
        self.context.emit(MachineEvent::Ended {
            key: self.active.clone(),
        });
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

    /// Forward `message` to the active state while running.
    pub fn send_message(&mut self, message: &dyn Any) {
        if !self.lifecycle.is_running() {
            return;
        }
        if let Some(state) = self.active_mut() {
            state.send_message(message);
        }
    }

    pub(crate) fn resume(&mut self, args: Option<&dyn Any>) {
        if self.lifecycle.is_running() {
            return;
        }
        let Some(key) = self.active.clone() else {
            return;
        };
        self.lifecycle = Lifecycle::Running;
        self.enter(&key, args);
        self.context.emit(MachineEvent::Started { key: Some(key) });
    }

    pub(crate) fn launch(&mut self, key: K, args: Option<&dyn Any>) {
        if self.lifecycle.is_running() || !self.states.contains_key(&key) {
            return;
        }
        // A suspended state that is being replaced still owes its exit.
        if self.lifecycle == Lifecycle::Suspended && self.active.as_ref() != Some(&key) {
            if let Some(previous) = self.active_mut() {
                previous.end();
            }
        }
        self.lifecycle = Lifecycle::Running;
        self.active = Some(key.clone());
        self.enter(&key, args);
        self.context.emit(MachineEvent::Started { key: Some(key) });
    }

    fn transition(&mut self, key: K, args: Option<&dyn Any>) -> Result<(), TransitionError> {
        if let Validation::Failure(reasons) = self.validate_change(&key) {
            let error = TransitionError::new(&key, reasons.iter().cloned().collect());
            self.context.rejected(&error);
            return Err(error);
        }

        let from = self.active.replace(key.clone());
        if let Some(previous) = from.as_ref().and_then(|k| self.states.get_mut(k)) {
            previous.end();
        }
        self.enter(&key, args);
        self.context.emit(MachineEvent::Transitioned { from, to: key });
        Ok(())
    }

    fn enter(&mut self, key: &K, args: Option<&dyn Any>) {
        if let Some(state) = self.states.get_mut(key) {
            match args {
                Some(args) => state.start_with(args),
                None => state.start(),
            }
        }
    }

    fn tick(&mut self, cadence: Cadence) {
        if !self.lifecycle.is_running() {
            return;
        }
        self.context.tick(cadence);
        if let Some(state) = self.active_mut() {
            cadence.apply(state.as_mut());
        }
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn State>> {
        let key = self.active.as_ref()?;
        self.states.get_mut(key)
    }
}

impl<K: StateKey> fmt::Debug for FlatMachine<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMachine")
            .field("context", &self.context)
            .field("lifecycle", &self.lifecycle)
            .field("active", &self.active)
            .field("keys", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: StateKey> State for FlatMachine<K> {
    fn start(&mut self) {
        Self::start(self);
    }

    fn start_with(&mut self, args: &dyn Any) {
        self.resume(Some(args));
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

impl<K: StateKey> Machine<K> for FlatMachine<K> {
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

    fn start_key(&mut self, key: K) {
        Self::start_key(self, key);
    }

    fn change(&mut self, key: K) {
        Self::change(self, key);
    }

    fn change_with(&mut self, key: K, args: &dyn Any) {
        Self::change_with(self, key, args);
    }

    fn clear(&mut self) {
        Self::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Probe, Tally};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B,
        C,
    }

    fn machine_with(keys: &[Key]) -> (FlatMachine<Key>, Vec<Tally>) {
        let mut machine = FlatMachine::new();
        let mut tallies = Vec::new();
        for key in keys {
            let (probe, tally) = Probe::new();
            machine.add(*key, Box::new(probe));
            tallies.push(tally);
        }
        (machine, tallies)
    }

    #[test]
    fn first_added_state_is_candidate_but_not_started() {
        let (machine, tallies) = machine_with(&[Key::A, Key::B]);

        assert_eq!(machine.active_key(), Some(&Key::A));
        assert_eq!(machine.lifecycle(), Lifecycle::Ended);
        assert_eq!(tallies[0].starts(), 0);
    }

    #[test]
    fn start_enters_candidate_once() {
        let (mut machine, tallies) = machine_with(&[Key::A]);
        machine.start();
        machine.start();

        assert_eq!(machine.lifecycle(), Lifecycle::Running);
        assert_eq!(tallies[0].starts(), 1);
    }

    #[test]
    fn start_without_states_is_noop() {
        let mut machine: FlatMachine<Key> = FlatMachine::new();
        machine.start();
        machine.start_key(Key::A);

        assert_eq!(machine.lifecycle(), Lifecycle::Ended);
        assert!(machine.active_key().is_none());
    }

    #[test]
    fn start_key_overrides_candidate() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.start_key(Key::B);

        assert_eq!(machine.active_key(), Some(&Key::B));
        assert_eq!(tallies[0].starts(), 0);
        assert_eq!(tallies[1].starts(), 1);
    }

    #[test]
    fn change_ends_previous_then_starts_target() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.start();
        machine.change(Key::B);

        assert_eq!(machine.active_key(), Some(&Key::B));
        assert_eq!(tallies[0].ends(), 1);
        assert_eq!(tallies[1].starts(), 1);
    }

    #[test]
    fn change_rejections_accumulate() {
        let (mut machine, _) = machine_with(&[Key::A]);

        let err = machine.try_change(Key::C).unwrap_err();
        assert_eq!(err.reasons.len(), 2);
        assert!(matches!(err.reasons[0], ChangeRejection::NotRunning { .. }));
        assert!(matches!(err.reasons[1], ChangeRejection::UnknownKey { .. }));

        machine.start();
        let err = machine.try_change(Key::A).unwrap_err();
        assert_eq!(
            err.reasons,
            vec![ChangeRejection::already_active(&Key::A)]
        );
    }

    #[test]
    fn guard_is_not_consulted_while_ended() {
        let mut machine = FlatMachine::new();
        let (idle, _) = Probe::new();
        let (blocked, tally) = Probe::new();
        let blocked = blocked.with_condition(false);
        machine.add(Key::A, Box::new(idle));
        machine.add(Key::B, Box::new(blocked));

        assert!(machine.validate_change(&Key::B).is_failure());
        assert_eq!(tally.conditions(), 0);

        machine.start();
        let err = machine.try_change(Key::B).unwrap_err();
        assert!(err.is_guard_rejection());
        assert_eq!(tally.conditions(), 1);
        assert_eq!(machine.active_key(), Some(&Key::A));
    }

    #[test]
    fn change_with_routes_arguments() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.start();
        machine.change_with(Key::B, &5i32);

        assert_eq!(tallies[1].args(), vec![5]);
        assert_eq!(tallies[1].starts(), 0);
    }

    #[test]
    fn suspend_pauses_updates_and_start_resumes() {
        let (mut machine, tallies) = machine_with(&[Key::A]);
        machine.start();
        machine.update();
        machine.suspend();
        machine.update();
        machine.fixed_update();

        assert_eq!(machine.lifecycle(), Lifecycle::Suspended);
        assert_eq!(tallies[0].suspends(), 1);
        assert_eq!(tallies[0].updates(), 1);

        machine.start();
        machine.custom_update();
        assert_eq!(tallies[0].starts(), 2);
        assert_eq!(tallies[0].custom_updates(), 1);
    }

    #[test]
    fn start_key_while_suspended_exits_previous() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.start();
        machine.suspend();
        machine.start_key(Key::B);

        assert_eq!(tallies[0].ends(), 1);
        assert_eq!(tallies[1].starts(), 1);
        assert_eq!(machine.active_key(), Some(&Key::B));
    }

    #[test]
    fn end_keeps_active_pointer_and_is_idempotent() {
        let (mut machine, tallies) = machine_with(&[Key::A]);
        machine.start();
        machine.end();
        machine.end();

        assert_eq!(machine.lifecycle(), Lifecycle::Ended);
        assert_eq!(machine.active_key(), Some(&Key::A));
        assert_eq!(tallies[0].ends(), 1);
    }

    #[test]
    fn replacing_active_state_ends_and_disposes_it() {
        let (mut machine, tallies) = machine_with(&[Key::A]);
        machine.start();

        let (replacement, fresh) = Probe::new();
        machine.add(Key::A, Box::new(replacement));

        assert_eq!(tallies[0].ends(), 1);
        assert_eq!(tallies[0].disposals(), 1);
        assert_eq!(machine.lifecycle(), Lifecycle::Ended);
        assert_eq!(machine.active_key(), Some(&Key::A));

        machine.start();
        assert_eq!(fresh.starts(), 1);
    }

    #[test]
    fn removing_inactive_state_only_disposes_it() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.start();

        assert!(machine.remove(&Key::B));
        assert!(!machine.remove(&Key::B));
        assert_eq!(tallies[1].disposals(), 1);
        assert_eq!(tallies[1].ends(), 0);
        assert_eq!(machine.lifecycle(), Lifecycle::Running);
    }

    #[test]
    fn removing_active_state_clears_pointer() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.start();
        machine.remove(&Key::A);

        assert_eq!(machine.lifecycle(), Lifecycle::Ended);
        assert!(machine.active_key().is_none());
        assert_eq!(tallies[0].ends(), 1);
        assert_eq!(tallies[0].disposals(), 1);

        machine.start();
        assert_eq!(machine.lifecycle(), Lifecycle::Ended);
    }

    #[test]
    fn clear_ends_and_disposes_everything_once() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B, Key::C]);
        machine.start();
        machine.clear();
        machine.clear();

        assert!(machine.is_empty());
        assert_eq!(tallies[0].ends(), 1);
        for tally in &tallies {
            assert_eq!(tally.disposals(), 1);
        }
    }

    #[test]
    fn messages_reach_only_running_active_state() {
        let (mut machine, tallies) = machine_with(&[Key::A, Key::B]);
        machine.send_message(&"early");
        machine.start();
        machine.send_message(&"hello");
        machine.suspend();
        machine.send_message(&"paused");

        assert_eq!(tallies[0].messages(), vec!["hello".to_string()]);
        assert!(tallies[1].messages().is_empty());
    }

    #[test]
    fn nested_machine_reports_status() {
        let (inner, tallies) = machine_with(&[Key::A]);
        let mut outer = FlatMachine::new();
        outer.add(Key::C, Box::new(inner));

        outer.start();
        outer.update();
        assert_eq!(tallies[0].starts(), 1);
        assert_eq!(tallies[0].updates(), 1);
        assert_eq!(
            outer.get(&Key::C).and_then(|s| s.status()),
            Some(Lifecycle::Running)
        );

        outer.clear();
        assert_eq!(tallies[0].ends(), 1);
        assert_eq!(tallies[0].disposals(), 1);
    }
}
