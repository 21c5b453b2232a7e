//! Reasons a transition request was not applied.
//!
//! The plain `change` entry points stay silent; these types back the
//! `try_change` variants for callers that want to know why.

use crate::core::Lifecycle;
use std::fmt::Debug;
use thiserror::Error;

/// One condition that blocked a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeRejection {
    #[error("machine is {lifecycle}, not Running")]
    NotRunning { lifecycle: Lifecycle },

    #[error("no state registered under '{key}'")]
    UnknownKey { key: String },

    #[error("'{key}' is already the active state")]
    AlreadyActive { key: String },

    #[error("guard on '{key}' refused entry")]
    GuardRejected { key: String },
}

impl ChangeRejection {
    pub(crate) fn unknown_key<K: Debug>(key: &K) -> Self {
        Self::UnknownKey {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn already_active<K: Debug>(key: &K) -> Self {
        Self::AlreadyActive {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn guard_rejected<K: Debug>(key: &K) -> Self {
        Self::GuardRejected {
            key: format!("{key:?}"),
        }
    }
}

/// A rejected transition and every reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transition to '{target}' rejected ({} reason(s))", .reasons.len())]
pub struct TransitionError {
    pub target: String,
    pub reasons: Vec<ChangeRejection>,
}

impl TransitionError {
    pub(crate) fn new<K: Debug>(target: &K, reasons: Vec<ChangeRejection>) -> Self {
        Self {
            target: format!("{target:?}"),
            reasons,
        }
    }

    pub fn is_guard_rejection(&self) -> bool {
        self.reasons
            .iter()
            .any(|r| matches!(r, ChangeRejection::GuardRejected { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_name_the_key() {
        let err = ChangeRejection::unknown_key(&"Attack");
        assert_eq!(err.to_string(), "no state registered under '\"Attack\"'");

        let err = ChangeRejection::NotRunning {
            lifecycle: Lifecycle::Suspended,
        };
        assert_eq!(err.to_string(), "machine is Suspended, not Running");
    }

    #[test]
    fn transition_error_counts_reasons() {
        let err = TransitionError::new(
            &3u8,
            vec![
                ChangeRejection::NotRunning {
                    lifecycle: Lifecycle::Ended,
                },
                ChangeRejection::unknown_key(&3u8),
            ],
        );
        assert_eq!(err.target, "3");
        assert_eq!(err.to_string(), "transition to '3' rejected (2 reason(s))");
        assert!(!err.is_guard_rejection());
    }
}
