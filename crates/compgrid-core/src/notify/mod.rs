//! Process-wide notification queue with immediate and deferred delivery.
//!
//! In [`DeliveryMode::Immediate`] every notification goes straight to the sinks.
//! In [`DeliveryMode::Deferred`] notifications are buffered and flushed in FIFO order on the switch back.
mod sink;
pub use sink::{MemorySink, NotificationSink, StdoutSink};

use std::{collections::VecDeque, fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, trace};

use compgrid_model::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[default]
    Immediate,
    Deferred,
}

impl DeliveryMode {
    pub fn flipped(self) -> Self {
        match self {
            DeliveryMode::Immediate => DeliveryMode::Deferred,
            DeliveryMode::Deferred => DeliveryMode::Immediate,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, DeliveryMode::Deferred)
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeliveryMode::Immediate => "immediate",
            DeliveryMode::Deferred => "deferred",
        })
    }
}

struct QueueInner {
    mode: DeliveryMode,
    buffer: VecDeque<Notification>,
    next_seq: u64,
}

/// Two-state delivery machine shared by everything that emits notifications.
pub struct NotificationQueue {
    inner: Mutex<QueueInner>,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationQueue {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                mode: DeliveryMode::Immediate,
                buffer: VecDeque::new(),
                next_seq: 0,
            }),
            sinks,
        }
    }

    /// Add a sink. Only possible before the queue is shared.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn mode(&self) -> DeliveryMode {
        self.inner.lock().mode
    }

    /// Number of notifications waiting for the switch back to immediate mode.
    pub fn pending(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    /// Stamp `notification` with the next sequence number, then deliver or buffer it.
    pub fn send(&self, mut notification: Notification) {
        let mut inner = self.inner.lock();
        inner.next_seq += 1;
        notification.seq = inner.next_seq;

        match inner.mode {
            DeliveryMode::Immediate => self.deliver(&notification),
            DeliveryMode::Deferred => {
                trace!(seq = notification.seq, "notification deferred");
                inner.buffer.push_back(notification);
            }
        }
    }

    /// Flip the mode and return the new one.
    ///
    /// Going back to immediate flushes the buffer before any later `send` can deliver.
    pub fn toggle(&self) -> DeliveryMode {
        let mut inner = self.inner.lock();
        let mode = inner.mode.flipped();
        self.switch(&mut inner, mode);
        mode
    }

    /// Force a mode. Returns the previous one.
    pub fn set_mode(&self, mode: DeliveryMode) -> DeliveryMode {
        let mut inner = self.inner.lock();
        let previous = inner.mode;
        if previous != mode {
            self.switch(&mut inner, mode);
        }
        previous
    }

    fn switch(&self, inner: &mut QueueInner, mode: DeliveryMode) {
        inner.mode = mode;
        if mode == DeliveryMode::Immediate {
            let flushed = inner.buffer.len();
            while let Some(n) = inner.buffer.pop_front() {
                self.deliver(&n);
            }
            debug!(flushed, "deferred notifications flushed");
        }
        debug!(%mode, "notification delivery mode changed");
    }

    fn deliver(&self, notification: &Notification) {
        for sink in &self.sinks {
            sink.deliver(notification);
        }
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(vec![Arc::new(StdoutSink)])
    }
}
