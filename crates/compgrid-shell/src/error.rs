use thiserror::Error;

use compgrid_core::CoreError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShellError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("invalid {what}: {value}")]
    InvalidNumber { what: &'static str, value: String },

    #[error("time limit must be positive")]
    ZeroLimit,

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("metrics unavailable: {0}")]
    Metrics(String),
}
