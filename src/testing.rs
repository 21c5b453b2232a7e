//! Recording leaf state shared by the unit tests.

use crate::core::State;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Counts {
    starts: usize,
    ends: usize,
    suspends: usize,
    updates: usize,
    fixed_updates: usize,
    custom_updates: usize,
    conditions: usize,
    disposals: usize,
    args: Vec<i32>,
    messages: Vec<String>,
}

/// Read side of a [`Probe`], kept by the test after the probe is boxed.
#[derive(Clone, Default)]
pub(crate) struct Tally(Rc<RefCell<Counts>>);

impl Tally {
    pub(crate) fn starts(&self) -> usize {
        self.0.borrow().starts
    }

    pub(crate) fn ends(&self) -> usize {
        self.0.borrow().ends
    }

    pub(crate) fn suspends(&self) -> usize {
        self.0.borrow().suspends
    }

    pub(crate) fn updates(&self) -> usize {
        self.0.borrow().updates
    }

    pub(crate) fn fixed_updates(&self) -> usize {
        self.0.borrow().fixed_updates
    }

    pub(crate) fn custom_updates(&self) -> usize {
        self.0.borrow().custom_updates
    }

    pub(crate) fn conditions(&self) -> usize {
        self.0.borrow().conditions
    }

    pub(crate) fn disposals(&self) -> usize {
        self.0.borrow().disposals
    }

    pub(crate) fn args(&self) -> Vec<i32> {
        self.0.borrow().args.clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.0.borrow().messages.clone()
    }
}

/// Leaf that counts every call made on it.
pub(crate) struct Probe {
    tally: Tally,
    allow: bool,
}

impl Probe {
    pub(crate) fn new() -> (Self, Tally) {
        let tally = Tally::default();
        let probe = Self {
            tally: tally.clone(),
            allow: true,
        };
        (probe, tally)
    }

    pub(crate) fn with_condition(mut self, allow: bool) -> Self {
        self.allow = allow;
        self
    }

    fn counts(&self) -> std::cell::RefMut<'_, Counts> {
        self.tally.0.borrow_mut()
    }
}

impl State for Probe {
    fn start(&mut self) {
        self.counts().starts += 1;
    }

    fn start_with(&mut self, args: &dyn Any) {
        match args.downcast_ref::<i32>() {
            Some(value) => self.counts().args.push(*value),
            None => self.start(),
        }
    }

    fn update(&mut self) {
        self.counts().updates += 1;
    }

    fn fixed_update(&mut self) {
        self.counts().fixed_updates += 1;
    }

    fn custom_update(&mut self) {
        self.counts().custom_updates += 1;
    }

    fn suspend(&mut self) {
        self.counts().suspends += 1;
    }

    fn end(&mut self) {
        self.counts().ends += 1;
    }

    fn condition(&self) -> bool {
        self.counts().conditions += 1;
        self.allow
    }

    fn send_message(&mut self, message: &dyn Any) {
        if let Some(text) = message.downcast_ref::<&str>() {
            self.counts().messages.push(text.to_string());
        }
    }

    fn dispose(self: Box<Self>) {
        self.counts().disposals += 1;
    }
}
