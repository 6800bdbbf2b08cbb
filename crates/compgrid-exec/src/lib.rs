//! Interchangeable execution backends for a single component computation.
//!
//! All three satisfy [`ExecBackend`]; [`compare`] runs the same workload on each.
mod error;
pub use error::{ExecError, ExecResult};

mod backend;
pub use backend::{BackendKind, ExecBackend};

mod completion;

mod task;
pub use task::TaskBackend;

mod socket;
pub use socket::SocketBackend;

mod queue;
pub use queue::QueueBackend;

mod rotation;
pub use rotation::{BackendFactory, BackendRotation};

mod compare;
pub use compare::{Comparison, compare};
