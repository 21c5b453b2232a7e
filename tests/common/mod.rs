//! Shared recording state for integration tests.

#![allow(dead_code)]

use nestfsm::State;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Calls {
    pub starts: usize,
    pub ends: usize,
    pub suspends: usize,
    pub updates: usize,
    pub disposals: usize,
    pub messages: Vec<String>,
}

pub type Log = Rc<RefCell<Calls>>;

/// Leaf that records every call into a shared [`Calls`].
pub struct Recorder {
    log: Log,
    allow: Rc<dyn Fn() -> bool>,
}

impl Recorder {
    pub fn new() -> (Self, Log) {
        Self::guarded(|| true)
    }

    pub fn guarded(allow: impl Fn() -> bool + 'static) -> (Self, Log) {
        let log = Log::default();
        let recorder = Self {
            log: Rc::clone(&log),
            allow: Rc::new(allow),
        };
        (recorder, log)
    }
}

impl State for Recorder {
    fn start(&mut self) {
        self.log.borrow_mut().starts += 1;
    }

    fn update(&mut self) {
        self.log.borrow_mut().updates += 1;
    }

    fn suspend(&mut self) {
        self.log.borrow_mut().suspends += 1;
    }

    fn end(&mut self) {
        self.log.borrow_mut().ends += 1;
    }

    fn condition(&self) -> bool {
        (self.allow)()
    }

    fn send_message(&mut self, message: &dyn Any) {
        if let Some(text) = message.downcast_ref::<String>() {
            self.log.borrow_mut().messages.push(text.clone());
        }
    }

    fn dispose(self: Box<Self>) {
        self.log.borrow_mut().disposals += 1;
    }
}
