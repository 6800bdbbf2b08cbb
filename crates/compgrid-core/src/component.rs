use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use compgrid_model::{ComponentInfo, ComponentStatus, Slot, Symbol};

/// Settled outcome of one run: the value, or the failure reason.
pub type RunOutcome = Result<f64, String>;

#[derive(Debug)]
struct Lifecycle {
    status: ComponentStatus,
    outcome: Option<RunOutcome>,
}

impl Lifecycle {
    fn created() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            status: ComponentStatus::Created,
            outcome: None,
        }))
    }
}

/// One configured calculation within a group.
///
/// A component is replaced by a fresh one on every run of its group. The replacement
/// carries the slot, the symbol and the deadline override over.
#[derive(Debug)]
pub struct Component {
    slot: Slot,
    symbol: Symbol,
    deadline: Option<Duration>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    pending: Option<PendingResult>,
}

impl Component {
    pub fn new(slot: Slot, symbol: Symbol) -> Self {
        Self {
            slot,
            symbol,
            deadline: None,
            lifecycle: Lifecycle::created(),
            pending: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Component-level deadline override.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn set_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    pub fn status(&self) -> ComponentStatus {
        self.lifecycle.lock().status
    }

    /// Handle to the result of the current run, if the component has been run.
    pub fn pending(&self) -> Option<&PendingResult> {
        self.pending.as_ref()
    }

    pub fn info(&self) -> ComponentInfo {
        let lifecycle = self.lifecycle.lock();
        let (result, error) = match &lifecycle.outcome {
            Some(Ok(value)) => (Some(*value), None),
            Some(Err(reason)) => (None, Some(reason.clone())),
            None => (None, None),
        };
        ComponentInfo {
            slot: self.slot,
            symbol: self.symbol,
            status: lifecycle.status,
            result,
            error,
            deadline_secs: self.deadline.map(|d| d.as_secs()),
        }
    }

    /// Fresh `CREATED` copy used as the starting point of the next run.
    pub(crate) fn successor(&self) -> Component {
        Component::new(self.slot, self.symbol).with_deadline(self.deadline)
    }

    /// Move to `RUNNING` and bind a pending result to `cancel`.
    ///
    /// The returned [`Settler`] is the only way to settle this run.
    pub(crate) fn arm(&mut self, cancel: CancellationToken) -> Settler {
        let (tx, rx) = watch::channel(false);
        self.lifecycle.lock().status = ComponentStatus::Running;
        self.pending = Some(PendingResult {
            lifecycle: Arc::clone(&self.lifecycle),
            settled: rx,
            cancel,
        });
        Settler {
            lifecycle: Arc::clone(&self.lifecycle),
            settled: tx,
        }
    }

    /// Abandon an in-flight run, if any. Its channel is closed by the run task.
    pub(crate) fn release(&self) {
        if let Some(pending) = &self.pending {
            pending.abandon();
        }
    }
}

/// Write side of a pending result, owned by the run task.
///
/// Dropping an unsettled settler marks the component `FAILED`, so a lost task never leaves it `RUNNING`.
#[derive(Debug)]
pub(crate) struct Settler {
    lifecycle: Arc<Mutex<Lifecycle>>,
    settled: watch::Sender<bool>,
}

impl Settler {
    pub(crate) fn settle(self, outcome: RunOutcome) -> ComponentStatus {
        let status = Self::store(&self.lifecycle, outcome);
        self.settled.send_replace(true);
        status
    }

    fn store(lifecycle: &Mutex<Lifecycle>, outcome: RunOutcome) -> ComponentStatus {
        let mut lifecycle = lifecycle.lock();
        lifecycle.status = match outcome {
            Ok(_) => ComponentStatus::Completed,
            Err(_) => ComponentStatus::Failed,
        };
        lifecycle.outcome = Some(outcome);
        lifecycle.status
    }
}

impl Drop for Settler {
    fn drop(&mut self) {
        if *self.settled.borrow() {
            return;
        }
        Self::store(&self.lifecycle, Err("task aborted".into()));
        self.settled.send_replace(true);
    }
}

/// Read side of one run's result.
#[derive(Debug, Clone)]
pub struct PendingResult {
    lifecycle: Arc<Mutex<Lifecycle>>,
    settled: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl PendingResult {
    pub fn is_settled(&self) -> bool {
        *self.settled.borrow()
    }

    /// Outcome if settled, without waiting.
    pub fn peek(&self) -> Option<RunOutcome> {
        self.lifecycle.lock().outcome.clone()
    }

    /// Wait until the run settles.
    pub async fn wait(&self) -> Option<RunOutcome> {
        let mut settled = self.settled.clone();
        let _ = settled.wait_for(|done| *done).await;
        self.peek()
    }

    /// Ask the run task to give up. It closes its channel and settles as failed.
    pub fn abandon(&self) {
        self.cancel.cancel();
    }
}
