use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GroupId, Slot, format_result};

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    ComponentCompleted,
    ComponentFailed,
    ComponentTimedOut,
    GroupCompleted,
}

/// Asynchronous status message produced by a run.
///
/// `seq` is the emission order stamped by the notification queue; it is `0` until the message has been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub seq: u64,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            kind,
            message: message.into(),
        }
    }

    pub fn component_completed(slot: Slot, value: f64) -> Self {
        Self::new(
            NotificationKind::ComponentCompleted,
            format!(
                "Component {slot} completed with result: {}",
                format_result(value)
            ),
        )
    }

    pub fn component_failed(slot: Slot, reason: impl fmt::Display) -> Self {
        Self::new(
            NotificationKind::ComponentFailed,
            format!("Component {slot} failed: {reason}"),
        )
    }

    pub fn component_timed_out(slot: Slot, reason: impl fmt::Display) -> Self {
        Self::new(
            NotificationKind::ComponentTimedOut,
            format!("Component {slot} failed due to time limit: {reason}"),
        )
    }

    pub fn group_completed(id: GroupId) -> Self {
        Self::new(NotificationKind::GroupCompleted, format!("Group {id} completed"))
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_texts() {
        assert_eq!(
            Notification::component_completed(2, 55.0).message,
            "Component 2 completed with result: 55.0"
        );
        assert_eq!(Notification::group_completed(7).message, "Group 7 completed");
        assert_eq!(
            Notification::component_timed_out(1, "timed out after 1s").message,
            "Component 1 failed due to time limit: timed out after 1s"
        );
    }

    #[test]
    fn fresh_notifications_are_unstamped() {
        let n = Notification::component_failed(0, "connection reset");
        assert_eq!(n.seq, 0);
        assert_eq!(n.kind, NotificationKind::ComponentFailed);
    }
}
