//! Command shell over the orchestration engine.
//!
//! [`CommandProcessor`] turns one input line into reply lines by calling a [`ShellHandler`].
//! [`EngineAdapter`] is the handler backed by the real registry and orchestrator.
mod error;
pub use error::ShellError;

mod command;
pub use command::{Command, LimitTarget};

mod handler;
pub use handler::{RunStarted, ShellHandler};

mod adapter;
pub use adapter::EngineAdapter;

mod processor;
pub use processor::{CommandProcessor, HELP, Reply};
