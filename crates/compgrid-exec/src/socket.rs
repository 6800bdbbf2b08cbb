use std::net::SocketAddr;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use compgrid_core::{Channel, RetryPolicy};
use compgrid_model::{Argument, Slot, Symbol};

use crate::{
    backend::{BackendKind, ExecBackend},
    completion::{Completion, completion},
    error::{ExecError, ExecResult},
};

/// Sends each computation to the service endpoint of its slot over a fresh channel.
pub struct SocketBackend {
    slot: Slot,
    symbol: Symbol,
    addr: SocketAddr,
    retry: RetryPolicy,
    current: Mutex<Option<Completion>>,
    cancel: CancellationToken,
}

impl SocketBackend {
    pub fn new(slot: Slot, symbol: Symbol, addr: SocketAddr, retry: RetryPolicy) -> Self {
        Self {
            slot,
            symbol,
            addr,
            retry,
            current: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl ExecBackend for SocketBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Socket
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn symbol(&self) -> Symbol {
        self.symbol
    }

    async fn compute(&self, input: Argument) -> ExecResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ExecError::ShutDown);
        }
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|c| !c.is_finished()) {
            return Err(ExecError::Busy);
        }

        let (tx, rx) = completion();
        let (slot, symbol, addr, retry) = (self.slot, self.symbol, self.addr, self.retry);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let exchange = async {
                let mut channel = Channel::connect(slot, addr, &retry).await?;
                let value = channel.request(input, symbol).await;
                channel.close().await;
                value
            };
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(ExecError::ShutDown),
                value = exchange => value.map_err(ExecError::from),
            };
            debug!(slot, ok = result.is_ok(), "socket backend settled");
            tx.complete(result);
        });
        trace!(slot, %symbol, input, %addr, "socket backend started");
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
        self.cancel.cancel();
    }
}
