use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tracing::debug;

use compgrid_core::RetryPolicy;
use compgrid_model::{Slot, Symbol};
use compgrid_service::{Endpoints, PacingTable};

use crate::{
    QueueBackend, SocketBackend, TaskBackend,
    backend::{BackendKind, ExecBackend},
    error::{ExecError, ExecResult},
};

/// Hands out backend kinds cyclically: task, socket, queue, task, ...
#[derive(Debug, Default)]
pub struct BackendRotation {
    next: AtomicUsize,
}

impl BackendRotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_kind(&self) -> BackendKind {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        BackendKind::ALL[i % BackendKind::ALL.len()]
    }
}

/// Builds backends of any kind for a slot and symbol.
pub struct BackendFactory {
    endpoints: Endpoints,
    pacing: Arc<PacingTable>,
    retry: RetryPolicy,
}

impl BackendFactory {
    pub fn new(endpoints: Endpoints, pacing: PacingTable) -> Self {
        Self {
            endpoints,
            pacing: Arc::new(pacing),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(&self, kind: BackendKind, slot: Slot, symbol: Symbol) -> ExecResult<Arc<dyn ExecBackend>> {
        debug!(%kind, slot, %symbol, "building backend");
        Ok(match kind {
            BackendKind::Task => Arc::new(TaskBackend::new(slot, symbol, Arc::clone(&self.pacing))),
            BackendKind::Socket => {
                let addr = self.endpoints.get(slot).ok_or(ExecError::NoEndpoint(slot))?;
                Arc::new(SocketBackend::new(slot, symbol, addr, self.retry))
            }
            BackendKind::Queue => Arc::new(QueueBackend::new(slot, symbol, Arc::clone(&self.pacing))),
        })
    }
}
