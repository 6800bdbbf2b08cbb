use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a component.
///
/// Transitions are strictly `Created → Running → {Completed | Failed}` within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatus {
    /// Component exists but has not been run yet.
    Created,
    /// A request is in flight.
    Running,
    /// The service returned a result.
    Completed,
    /// The request failed, was rejected, or exceeded its deadline.
    Failed,
}

impl ComponentStatus {
    /// Returns `true` if the component settled in this run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComponentStatus::Completed | ComponentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Created => "CREATED",
            ComponentStatus::Running => "RUNNING",
            ComponentStatus::Completed => "COMPLETED",
            ComponentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
