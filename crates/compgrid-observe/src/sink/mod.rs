use tracing::{debug, info, warn};

use compgrid_core::NotificationSink;
use compgrid_model::{Notification, NotificationKind};

/// Short description of what a notification kind reports.
#[inline]
pub fn message_for(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::ComponentCompleted => "component settled with a value",
        NotificationKind::ComponentFailed => "component failed",
        NotificationKind::ComponentTimedOut => "component exceeded its time limit",
        NotificationKind::GroupCompleted => "every component of the group settled",
    }
}

/// Mirror one notification into the log, at a level chosen by its kind.
#[inline]
pub fn log_notification(n: &Notification) {
    let msg = message_for(n.kind);
    match n.kind {
        NotificationKind::ComponentCompleted => debug!(seq = n.seq, text = %n.message, "{msg}"),
        NotificationKind::ComponentFailed => warn!(seq = n.seq, text = %n.message, "{msg}"),
        NotificationKind::ComponentTimedOut => warn!(seq = n.seq, text = %n.message, "{msg}"),
        NotificationKind::GroupCompleted => info!(seq = n.seq, text = %n.message, "{msg}"),
    }
}

/// Notification sink that writes to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn deliver(&self, notification: &Notification) {
        log_notification(notification);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use compgrid_core::{MemorySink, NotificationQueue};

    use super::*;

    #[test]
    fn every_kind_has_a_message() {
        for kind in [
            NotificationKind::ComponentCompleted,
            NotificationKind::ComponentFailed,
            NotificationKind::ComponentTimedOut,
            NotificationKind::GroupCompleted,
        ] {
            assert!(!message_for(kind).is_empty());
        }
    }

    #[test]
    fn log_sink_sits_beside_other_sinks() {
        let memory = Arc::new(MemorySink::new());
        let queue = NotificationQueue::new(vec![Arc::new(LogSink::new()), memory.clone()]);
        queue.send(Notification::group_completed(1));
        assert_eq!(memory.messages(), vec!["Group 1 completed"]);
    }
}
