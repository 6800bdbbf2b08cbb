use thiserror::Error;

use compgrid_core::CoreError;
use compgrid_model::Slot;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    #[error("backend is shut down")]
    ShutDown,
    #[error("a computation is already in flight")]
    Busy,
    #[error("no computation was started")]
    NotStarted,
    #[error("no endpoint for slot {0}")]
    NoEndpoint(Slot),
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("worker stopped before answering")]
    WorkerGone,
}
