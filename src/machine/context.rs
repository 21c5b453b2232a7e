//! Identity, configuration and event emission shared by every machine kind.

use super::config::MachineConfig;
use crate::core::State;
use crate::observe::{MachineEvent, MachineId, ObservedEvent, Observer};
use chrono::Utc;
use std::fmt::{self, Debug};
use tracing::{debug, trace};

/// The three update cadences a driver loop can tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cadence {
    Update,
    FixedUpdate,
    CustomUpdate,
}

impl Cadence {
    pub(crate) fn apply<S: State + ?Sized>(self, state: &mut S) {
        match self {
            Self::Update => state.update(),
            Self::FixedUpdate => state.fixed_update(),
            Self::CustomUpdate => state.custom_update(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::FixedUpdate => "fixed_update",
            Self::CustomUpdate => "custom_update",
        }
    }
}

pub(crate) struct MachineContext<K> {
    id: MachineId,
    config: MachineConfig,
    observer: Option<Box<dyn Observer<K>>>,
}

impl<K: Clone + Debug> MachineContext<K> {
    pub(crate) fn new() -> Self {
        Self {
            id: MachineId::new(),
            config: MachineConfig::default(),
            observer: None,
        }
    }

    pub(crate) fn id(&self) -> MachineId {
        self.id
    }

    pub(crate) fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: MachineConfig) {
        self.config = config;
    }

    /// Install `observer`, dropping any previous one, and announce the
    /// machine to it.
    pub(crate) fn attach(&mut self, observer: Box<dyn Observer<K>>) {
        self.observer = Some(observer);
        self.emit(MachineEvent::Created);
    }

    pub(crate) fn emit(&mut self, event: MachineEvent<K>) {
        debug!(
            machine = self.config.display_name(),
            id = %self.id,
            event = ?event,
            "machine event"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(&ObservedEvent {
                machine: self.id,
                timestamp: Utc::now(),
                event,
            });
        }
    }

    pub(crate) fn rejected(&self, error: &dyn fmt::Display) {
        trace!(
            machine = self.config.display_name(),
            id = %self.id,
            %error,
            "transition rejected"
        );
    }

    pub(crate) fn tick(&self, cadence: Cadence) {
        if self.config.trace_updates {
            trace!(
                machine = self.config.display_name(),
                id = %self.id,
                cadence = cadence.as_str(),
                "tick"
            );
        }
    }
}

impl<K> Debug for MachineContext<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineContext")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
