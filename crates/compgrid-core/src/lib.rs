//! Orchestration engine: groups of components dispatched concurrently to the calculation service.
//!
//! [`GroupRegistry`] owns the groups, [`Orchestrator`] runs them, and [`NotificationQueue`]
//! surfaces what the runs report.
mod error;
pub use error::{CoreError, CoreResult};

mod retry;
pub use retry::RetryPolicy;

mod channel;
pub use channel::Channel;

mod component;
pub use component::{Component, PendingResult, RunOutcome};

mod group;
pub use group::Group;

mod registry;
pub use registry::GroupRegistry;

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics, Outcome};

pub mod notify;
pub use notify::{DeliveryMode, MemorySink, NotificationQueue, NotificationSink, StdoutSink};

mod orchestrator;
pub use orchestrator::{Orchestrator, RunReport, SkippedComponent};

pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::{
        DeliveryMode, GroupRegistry, NotificationQueue, NotificationSink, Orchestrator,
        RetryPolicy, RunReport,
    };
}
