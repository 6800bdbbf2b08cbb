use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use compgrid_model::{Argument, Slot, Symbol};
use compgrid_service::{PacingTable, evaluate};

use crate::{
    backend::{BackendKind, ExecBackend},
    completion::{Completion, completion},
    error::{ExecError, ExecResult},
};

/// Evaluates in-process on the blocking pool.
pub struct TaskBackend {
    slot: Slot,
    symbol: Symbol,
    pacing: Arc<PacingTable>,
    current: Mutex<Option<Completion>>,
    closed: AtomicBool,
}

impl TaskBackend {
    pub fn new(slot: Slot, symbol: Symbol, pacing: Arc<PacingTable>) -> Self {
        Self {
            slot,
            symbol,
            pacing,
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ExecBackend for TaskBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Task
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn symbol(&self) -> Symbol {
        self.symbol
    }

    async fn compute(&self, input: Argument) -> ExecResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ExecError::ShutDown);
        }
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|c| !c.is_finished()) {
            return Err(ExecError::Busy);
        }

        let (tx, rx) = completion();
        let symbol = self.symbol;
        let pacing = Arc::clone(&self.pacing);
        tokio::task::spawn_blocking(move || {
            tx.complete(Ok(evaluate(symbol, input, &pacing)));
        });
        trace!(slot = self.slot, %symbol, input, "task backend started");
        *current = Some(rx);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.current.lock().as_ref().is_some_and(Completion::is_finished)
    }

    async fn outcome(&self) -> ExecResult<f64> {
        let current = self.current.lock().clone();
        match current {
            Some(c) => c.wait().await,
            None => Err(ExecError::NotStarted),
        }
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
