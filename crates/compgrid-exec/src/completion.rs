use tokio::sync::watch;

use crate::error::{ExecError, ExecResult};

type Cell = Option<ExecResult<f64>>;

/// Write side of a single-assignment result.
pub(crate) struct CompletionTx(watch::Sender<Cell>);

impl CompletionTx {
    pub(crate) fn complete(self, result: ExecResult<f64>) {
        self.0.send_replace(Some(result));
    }
}

impl Drop for CompletionTx {
    fn drop(&mut self) {
        if self.0.borrow().is_none() {
            self.0.send_replace(Some(Err(ExecError::WorkerGone)));
        }
    }
}

/// Read side of a single-assignment result.
#[derive(Clone)]
pub(crate) struct Completion(watch::Receiver<Cell>);

impl Completion {
    pub(crate) fn is_finished(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub(crate) async fn wait(&self) -> ExecResult<f64> {
        let mut rx = self.0.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(cell) => cell.clone().unwrap_or(Err(ExecError::WorkerGone)),
            Err(_) => Err(ExecError::WorkerGone),
        }
    }
}

pub(crate) fn completion() -> (CompletionTx, Completion) {
    let (tx, rx) = watch::channel(None);
    (CompletionTx(tx), Completion(rx))
}
