use serde::{Deserialize, Serialize};

use crate::{ComponentStatus, Slot, Symbol};

/// Placeholder printed for a result that has not settled.
pub const NOT_AVAILABLE: &str = "N/A";

/// Render a calculation result the way the shell prints it.
///
/// Whole numbers keep one decimal place (`120.0`), anything else uses the shortest round-trip form.
pub fn format_result(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Point-in-time snapshot of one component, as returned by `status` and `summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    /// Position in the group and endpoint selector.
    pub slot: Slot,
    /// Calculation kind.
    pub symbol: Symbol,
    /// Current lifecycle state.
    pub status: ComponentStatus,
    /// Result of the last settled run, if it succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    /// Failure reason of the last settled run, if it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Component-level deadline override, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl ComponentInfo {
    /// Text for the `Result=` column of a summary line.
    ///
    /// The settled value once the task finished successfully, `Error: …` once it failed, [`NOT_AVAILABLE`] otherwise.
    pub fn result_label(&self) -> String {
        match (&self.result, &self.error) {
            (Some(value), _) => format_result(*value),
            (None, Some(err)) => format!("Error: {err}"),
            (None, None) => NOT_AVAILABLE.to_string(),
        }
    }
}
