use std::{fmt, str::FromStr};

use async_trait::async_trait;

use compgrid_model::{Argument, Slot, Symbol};

use crate::error::ExecResult;

/// Which execution strategy a backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Blocking evaluation on the runtime's blocking pool.
    Task,
    /// Request over a channel to the service endpoint of the slot.
    Socket,
    /// Producer/consumer handoff to a dedicated worker.
    Queue,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Task, BackendKind::Socket, BackendKind::Queue];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Task => "task",
            BackendKind::Socket => "socket",
            BackendKind::Queue => "queue",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown backend: {s}"))
    }
}

/// Interchangeable way of computing one component's value.
///
/// `compute` starts a computation and returns at once; `outcome` waits for it.
/// After `shutdown` every `compute` fails with [`crate::ExecError::ShutDown`].
#[async_trait]
pub trait ExecBackend: Send + Sync + 'static {
    fn kind(&self) -> BackendKind;

    fn slot(&self) -> Slot;

    fn symbol(&self) -> Symbol;

    async fn compute(&self, input: Argument) -> ExecResult<()>;

    fn is_finished(&self) -> bool;

    async fn outcome(&self) -> ExecResult<f64>;

    async fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Socket".parse::<BackendKind>(), Ok(BackendKind::Socket));
        assert_eq!("queue".parse::<BackendKind>(), Ok(BackendKind::Queue));
        assert!("thread".parse::<BackendKind>().is_err());
    }
}
