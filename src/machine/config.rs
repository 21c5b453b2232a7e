//! Per-machine configuration.

use serde::{Deserialize, Serialize};

const UNNAMED: &str = "machine";

/// Settings attached to a machine at construction.
///
/// Deserializable so hosts can keep machine settings alongside the rest of
/// their configuration; missing fields fall back to [`Default`].
///
/// # Example
///
/// ```rust
/// use nestfsm::machine::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_str(r#"{"name": "enemy-ai"}"#).unwrap();
/// assert_eq!(config.display_name(), "enemy-ai");
/// assert!(!config.trace_updates);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Name used in log records and diagnostics.
    pub name: Option<String>,

    /// Emit a trace record for every forwarded update tick.
    pub trace_updates: bool,
}

impl MachineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn trace_updates(mut self, enabled: bool) -> Self {
        self.trace_updates = enabled;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }
}
