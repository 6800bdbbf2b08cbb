use std::time::Duration;

use thiserror::Error;

use compgrid_model::{GroupId, ModelError, Slot};
use compgrid_service::ProtoError;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("No group selected")]
    NoGroupSelected,
    #[error("Invalid component symbol: {0}")]
    InvalidSymbol(char),
    #[error("Invalid group id: {0} (must be positive)")]
    InvalidGroupId(GroupId),
    #[error("Component not found: {0}")]
    ComponentNotFound(Slot),
    #[error("No endpoint for slot {slot} ({endpoints} endpoints configured)")]
    SlotOutOfRange { slot: Slot, endpoints: usize },
    #[error("Group {0} is still running")]
    GroupRunning(GroupId),
    #[error("could not connect to slot {slot} after {attempts} attempts: {reason}")]
    ConnectionExhausted {
        slot: Slot,
        attempts: u32,
        reason: String,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(String),
    #[error("cancelled")]
    Cancelled,
}

impl CoreError {
    /// True for a deadline expiry, which is reported apart from other failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::Timeout(_))
    }
}

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InvalidSymbol(c) => CoreError::InvalidSymbol(c),
            ModelError::InvalidGroupId(id) => CoreError::InvalidGroupId(id),
        }
    }
}

impl From<ProtoError> for CoreError {
    fn from(e: ProtoError) -> Self {
        match e {
            ProtoError::Io(io) => CoreError::Io(io.to_string()),
            other => CoreError::Protocol(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}
