//! Domain vocabulary shared by the calculation service, the orchestrator and the shell.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
