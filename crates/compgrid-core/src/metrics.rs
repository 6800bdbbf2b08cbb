use std::{fmt, sync::Arc, time::Duration};

use compgrid_model::{GroupId, Slot, Symbol};

/// How a component run settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Completed,
    Failed,
    TimedOut,
}

impl Outcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Failed => "failed",
            Outcome::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Instrumentation seam of the orchestrator.
pub trait MetricsBackend: Send + Sync + 'static {
    fn run_started(&self, group: GroupId);
    fn component_started(&self, symbol: Symbol);
    fn component_settled(&self, symbol: Symbol, outcome: Outcome, elapsed: Duration);
    fn connect_exhausted(&self, slot: Slot);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn run_started(&self, _group: GroupId) {}
    fn component_started(&self, _symbol: Symbol) {}
    fn component_settled(&self, _symbol: Symbol, _outcome: Outcome, _elapsed: Duration) {}
    fn connect_exhausted(&self, _slot: Slot) {}
}

pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoopMetrics)
}
