//! The State contract shared by leaves and machines.
//!
//! Every leaf behavior and every machine implements [`State`], which is
//! what lets a whole machine sit in a slot of another machine without
//! special-casing.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Activity status of a machine, or of a single composite entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Not active. Initial status of every machine.
    #[default]
    Ended,
    /// Active and receiving update cadences.
    Running,
    /// Paused without exiting; updates are withheld until resumed.
    Suspended,
}

impl Lifecycle {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ended => "Ended",
            Self::Running => "Running",
            Self::Suspended => "Suspended",
        };
        f.write_str(name)
    }
}

/// Bound for registry keys.
///
/// Any small discrete identifier works; a fieldless enum deriving
/// `Clone, Debug, PartialEq, Eq, Hash` is the usual choice. The composite
/// machine additionally requires `Ord`.
pub trait StateKey: Clone + Eq + Hash + Debug + 'static {}

impl<T> StateKey for T where T: Clone + Eq + Hash + Debug + 'static {}

/// Behavior contract for states and machines.
///
/// Machines own their states as `Box<dyn State>` and are the only callers of
/// these methods while the state is registered. Only [`start`](State::start)
/// and [`end`](State::end) are required; everything else has a neutral
/// default.
///
/// # Example
///
/// ```rust
/// use nestfsm::core::State;
/// use std::any::Any;
///
/// struct Patrol {
///     waypoint: usize,
/// }
///
/// impl State for Patrol {
///     fn start(&mut self) {
///         self.waypoint = 0;
///     }
///
///     fn start_with(&mut self, args: &dyn Any) {
///         match args.downcast_ref::<usize>() {
///             Some(first) => self.waypoint = *first,
///             None => self.start(),
///         }
///     }
///
///     fn update(&mut self) {
///         self.waypoint += 1;
///     }
///
///     fn end(&mut self) {}
/// }
///
/// let mut patrol = Patrol { waypoint: 9 };
/// patrol.start_with(&3usize);
/// patrol.update();
/// assert_eq!(patrol.waypoint, 4);
/// ```
pub trait State {
    /// Enter the state. Called once per activation.
    fn start(&mut self);

    /// Enter the state with a transient argument bundle.
    ///
    /// The bundle is not retained by the machine. States that take no
    /// arguments keep the default, which falls back to [`start`](State::start).
    fn start_with(&mut self, args: &dyn Any) {
        let _ = args;
        self.start();
    }

    /// Per-tick update cadence.
    fn update(&mut self) {}

    /// Fixed-step update cadence.
    fn fixed_update(&mut self) {}

    /// Caller-defined update cadence.
    fn custom_update(&mut self) {}

    /// Pause without exiting.
    fn suspend(&mut self) {}

    /// Exit the state. Called once per activation.
    fn end(&mut self);

    /// Guard evaluated when this state is the candidate target of a transition.
    fn condition(&self) -> bool {
        true
    }

    /// Inbound message; payloads of unknown type should be ignored.
    fn send_message(&mut self, message: &dyn Any) {
        let _ = message;
    }

    /// Release held resources.
    ///
    /// Consumes the state, so teardown cannot happen twice.
    fn dispose(self: Box<Self>) {}

    /// The state's own lifecycle, if it tracks one.
    ///
    /// Machines report their status; plain leaves report `None`.
    fn status(&self) -> Option<Lifecycle> {
        None
    }
}
