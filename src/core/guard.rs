//! Guard predicates for gating transitions.
//!
//! A state's [`condition`](crate::core::State::condition) is evaluated on the
//! candidate target of a transition. [`Guard`] lets that check be supplied
//! as a closure instead of being written into the state type.

use super::state::{Lifecycle, State};
use std::any::Any;
use std::fmt;

/// Predicate that decides whether a state may be entered.
///
/// Guards are read-only checks. They typically close over shared world
/// state (`Rc<Cell<_>>` and the like) that the caller updates between ticks.
///
/// # Example
///
/// ```rust
/// use nestfsm::core::Guard;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let has_target = Rc::new(Cell::new(false));
/// let guard = {
///     let has_target = Rc::clone(&has_target);
///     Guard::new(move || has_target.get())
/// };
///
/// assert!(!guard.check());
/// has_target.set(true);
/// assert!(guard.check());
/// ```
pub struct Guard {
    predicate: Box<dyn Fn() -> bool>,
}

impl Guard {
    /// Create a guard from a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Guard that never blocks.
    pub fn always() -> Self {
        Self::new(|| true)
    }

    /// Guard that always blocks.
    pub fn never() -> Self {
        Self::new(|| false)
    }

    /// Evaluate the predicate.
    pub fn check(&self) -> bool {
        (self.predicate)()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

/// A state whose `condition()` is both its own check and a [`Guard`].
pub struct Guarded<S> {
    inner: S,
    guard: Guard,
}

impl<S: State> Guarded<S> {
    /// Wrap `inner` so transitions into it also require `guard`.
    pub fn new(inner: S, guard: Guard) -> Self {
        Self { inner, guard }
    }

    /// The wrapped state.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap, dropping the guard.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: State> State for Guarded<S> {
    fn start(&mut self) {
        self.inner.start();
    }

    fn start_with(&mut self, args: &dyn Any) {
        self.inner.start_with(args);
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

    fn condition(&self) -> bool {
        self.guard.check() && self.inner.condition()
    }

    fn send_message(&mut self, message: &dyn Any) {
        self.inner.send_message(message);
    }

    fn dispose(self: Box<Self>) {
        Box::new(self.inner).dispose();
    }

    fn status(&self) -> Option<Lifecycle> {
        self.inner.status()
    }
}

/// Combinators available on every sized [`State`].
pub trait StateExt: State + Sized {
    /// Gate entry into this state on `predicate`.
    fn guarded<F>(self, predicate: F) -> Guarded<Self>
    where
        F: Fn() -> bool + 'static,
    {
        Guarded::new(self, Guard::new(predicate))
    }

    /// Box the state for registration.
    fn boxed(self) -> Box<dyn State>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<S: State> StateExt for S {}
