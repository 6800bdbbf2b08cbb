use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, trace, warn};

use compgrid_model::{Argument, Slot, Symbol};
use compgrid_service::{PacingTable, evaluate};

use crate::{
    backend::{BackendKind, ExecBackend},
    completion::{Completion, CompletionTx, completion},
    error::{ExecError, ExecResult},
};

const QUEUE_DEPTH: usize = 16;

struct Job {
    input: Argument,
    reply: CompletionTx,
}

/// Hands each computation to a dedicated worker through a bounded queue.
pub struct QueueBackend {
    slot: Slot,
    symbol: Symbol,
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    current: Mutex<Option<Completion>>,
}

impl QueueBackend {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn new(slot: Slot, symbol: Symbol, pacing: Arc<PacingTable>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = tokio::spawn(consume(slot, symbol, pacing, rx));
        Self {
            slot,
            symbol,
            jobs: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            current: Mutex::new(None),
        }
    }
}

async fn consume(slot: Slot, symbol: Symbol, pacing: Arc<PacingTable>, mut rx: mpsc::Receiver<Job>) {
    debug!(slot, "queue worker started");
    while let Some(Job { input, reply }) = rx.recv().await {
        let pacing = Arc::clone(&pacing);
        match tokio::task::spawn_blocking(move || evaluate(symbol, input, &pacing)).await {
            Ok(value) => reply.complete(Ok(value)),
            Err(e) => {
                warn!(slot, error = %e, "queue worker evaluation failed");
                reply.complete(Err(ExecError::WorkerGone));
            }
        }
    }
    debug!(slot, "queue worker stopped");
}

#[async_trait]
impl ExecBackend for QueueBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Queue
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn symbol(&self) -> Symbol {
        self.symbol
    }

    async fn compute(&self, input: Argument) -> ExecResult<()> {
        let sender = self.jobs.lock().clone().ok_or(ExecError::ShutDown)?;
        let reply = {
            let mut current = self.current.lock();
            if current.as_ref().is_some_and(|c| !c.is_finished()) {
                return Err(ExecError::Busy);
            }
            let (reply, rx) = completion();
            *current = Some(rx);
            reply
        };

        sender
            .send(Job { input, reply })
            .await
            .map_err(|_| ExecError::ShutDown)?;
        trace!(slot = self.slot, input, "job queued");
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

    /// Close the queue and wait for the worker to drain it.
    async fn shutdown(&self) {
        self.jobs.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            warn!(slot = self.slot, error = %e, "queue worker ended abnormally");
        }
    }
}
