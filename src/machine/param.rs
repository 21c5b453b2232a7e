//! Flat machine with typed entry arguments.

use super::flat::FlatMachine;
use super::rejection::TransitionError;
use super::{Machine, MachineConfig};
use crate::core::{Lifecycle, State, StateKey};
use crate::observe::Observer;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// A [`FlatMachine`] whose entry points take an argument bundle of type `A`.
///
/// Arguments are handed to the target's
/// [`start_with`](crate::core::State::start_with); targets that do not
/// override it fall back to plain `start`. The bundle is never retained.
/// Everything else is the flat machine, reachable through `Deref`.
///
/// # Example
///
/// ```rust
/// use nestfsm::core::State;
/// use nestfsm::machine::ParamMachine;
/// use std::any::Any;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// struct Spawn {
///     at: Rc<Cell<(i32, i32)>>,
/// }
///
/// impl State for Spawn {
///     fn start(&mut self) {}
///
///     fn start_with(&mut self, args: &dyn Any) {
///         if let Some(position) = args.downcast_ref::<(i32, i32)>() {
///             self.at.set(*position);
///         }
///     }
///
///     fn end(&mut self) {}
/// }
///
/// let at = Rc::new(Cell::new((0, 0)));
/// let mut machine: ParamMachine<&str, (i32, i32)> = ParamMachine::new();
/// machine.add("spawn", Box::new(Spawn { at: Rc::clone(&at) }));
/// machine.start_key_with("spawn", &(4, 2));
///
/// assert_eq!(at.get(), (4, 2));
/// ```
pub struct ParamMachine<K: StateKey, A> {
    inner: FlatMachine<K>,
    _args: PhantomData<fn(&A)>,
}

impl<K: StateKey, A: Any> Default for ParamMachine<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StateKey, A: Any> ParamMachine<K, A> {
    /// Create an empty, ended machine.
    pub fn new() -> Self {
        Self::from_flat(FlatMachine::new())
    }

    /// Wrap an existing flat machine.
    pub fn from_flat(inner: FlatMachine<K>) -> Self {
        Self {
            inner,
            _args: PhantomData,
        }
    }

    /// Unwrap into the underlying flat machine.
    pub fn into_inner(self) -> FlatMachine<K> {
        self.inner
    }

    /// Replace the machine config.
    pub fn with_config(self, config: MachineConfig) -> Self {
        Self::from_flat(self.inner.with_config(config))
    }

    /// Attach a debug observer, replacing any attached earlier.
    pub fn with_observer<O>(self, observer: O) -> Self
    where
        O: Observer<K> + 'static,
    {
        Self::from_flat(self.inner.with_observer(observer))
    }

    /// Start (or resume) the current candidate with `args`. No-op while running.
    pub fn start_with(&mut self, args: &A) {
        self.inner.resume(Some(args as &dyn Any));
    }

    /// Start the state under `key` with `args`. No-op while running.
    pub fn start_key_with(&mut self, key: K, args: &A) {
        self.inner.launch(key, Some(args as &dyn Any));
    }

    /// Transition to `key`, entering it with `args`. Silently ignored when refused.
    pub fn change_with(&mut self, key: K, args: &A) {
        self.inner.change_with(key, args);
    }

    /// Transition to `key` with `args`, reporting why the request was refused.
    pub fn try_change_with(&mut self, key: K, args: &A) -> Result<(), TransitionError> {
        self.inner.try_change_with(key, args)
    }
}

impl<K: StateKey, A> Deref for ParamMachine<K, A> {
    type Target = FlatMachine<K>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<K: StateKey, A> DerefMut for ParamMachine<K, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<K: StateKey, A> fmt::Debug for ParamMachine<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParamMachine").field(&self.inner).finish()
    }
}

impl<K: StateKey, A: Any> State for ParamMachine<K, A> {
    fn start(&mut self) {
        self.inner.start();
    }

    fn start_with(&mut self, args: &dyn Any) {
        self.inner.resume(Some(args));
    }

    fn update(&mut self) {
        self.inner.update();
    }

    fn fixed_update(&mut self) {
        self.inner.fixed_update();
    }

    fn custom_update(&mut self) {
        self.inner.custom_update();
    }

    fn suspend(&mut self) {
        self.inner.suspend();
    }

    fn end(&mut self) {
        self.inner.end();
    }

    fn send_message(&mut self, message: &dyn Any) {
        self.inner.send_message(message);
    }

    fn dispose(mut self: Box<Self>) {
        self.inner.clear();
    }

    fn status(&self) -> Option<Lifecycle> {
        Some(self.inner.lifecycle())
    }
}

impl<K: StateKey, A: Any> Machine<K> for ParamMachine<K, A> {
    fn add(&mut self, key: K, state: Box<dyn State>) {
        self.inner.add(key, state);
    }

    fn remove(&mut self, key: &K) -> bool {
        self.inner.remove(key)
    }

    fn get(&self, key: &K) -> Option<&dyn State> {
        self.inner.get(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle()
    }

    fn start_key(&mut self, key: K) {
        self.inner.start_key(key);
    }

    fn change(&mut self, key: K) {
        self.inner.change(key);
    }

    fn change_with(&mut self, key: K, args: &dyn Any) {
        self.inner.change_with(key, args);
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}
