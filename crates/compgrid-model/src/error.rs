use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid component symbol: {0}")]
    InvalidSymbol(char),
    #[error("Invalid group id: {0} (must be positive)")]
    InvalidGroupId(u32),
}
