use std::io::Write;

use parking_lot::Mutex;

use compgrid_model::Notification;

/// Destination of delivered notifications.
///
/// `deliver` is called while the queue holds its lock, so deliveries never interleave.
/// An implementation must not call back into the queue.
pub trait NotificationSink: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn deliver(&self, notification: &Notification);
}

/// Prints each notification as one line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn deliver(&self, notification: &Notification) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{notification}");
        let _ = out.flush();
    }
}

/// Keeps every delivered notification in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.lock().is_empty()
    }

    pub fn clear(&self) {
        self.delivered.lock().clear();
    }
}

impl NotificationSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn deliver(&self, notification: &Notification) {
        self.delivered.lock().push(notification.clone());
    }
}
