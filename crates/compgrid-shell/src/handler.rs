use std::time::Duration;

use async_trait::async_trait;

use compgrid_core::{DeliveryMode, RunReport};
use compgrid_model::{Argument, ComponentInfo, ComponentStatus, GroupId, Slot, Symbol};

use crate::error::ShellError;

/// A run as seen by the shell: the deadline in force plus what was scheduled.
#[derive(Debug)]
pub struct RunStarted {
    pub deadline: Option<Duration>,
    pub report: RunReport,
}

/// Operations the shell commands map to.
///
/// This trait abstracts the engine, so a front end can be driven by something other than
/// [`crate::EngineAdapter`] (a recording fake in tests, for instance).
#[async_trait]
pub trait ShellHandler: Send + Sync + 'static {
    /// Create the group if unseen and make it current.
    async fn switch_group(&self, id: GroupId) -> Result<GroupId, ShellError>;

    /// Set the current group's deadline.
    async fn set_group_limit(&self, limit: Duration) -> Result<GroupId, ShellError>;

    /// Set a component's deadline override in the current group.
    async fn set_component_limit(&self, slot: Slot, limit: Duration) -> Result<(), ShellError>;

    async fn add_component(&self, symbol: char) -> Result<(Slot, Symbol), ShellError>;

    async fn run(&self, argument: Argument) -> Result<RunStarted, ShellError>;

    async fn status(&self, slot: Slot) -> Result<ComponentStatus, ShellError>;

    async fn summary(&self) -> Result<(GroupId, Vec<ComponentInfo>), ShellError>;

    /// Flip notification delivery and return the new mode.
    async fn toggle_interactive(&self) -> DeliveryMode;

    /// Prometheus text exposition of the engine metrics.
    async fn metrics(&self) -> Result<String, ShellError>;
}
