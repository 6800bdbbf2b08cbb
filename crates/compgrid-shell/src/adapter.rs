use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::debug;

use compgrid_core::{DeliveryMode, GroupRegistry, Orchestrator};
use compgrid_model::{Argument, ComponentInfo, ComponentStatus, GroupId, Slot, Symbol};
use compgrid_prometheus::PrometheusMetrics;

use crate::{
    error::ShellError,
    handler::{RunStarted, ShellHandler},
};

/// Adapter that bridges the registry and the orchestrator to [`ShellHandler`].
pub struct EngineAdapter {
    registry: Arc<GroupRegistry>,
    orchestrator: Arc<Orchestrator>,
    metrics: Option<PrometheusMetrics>,
}

impl EngineAdapter {
    pub fn new(registry: Arc<GroupRegistry>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            registry,
            orchestrator,
            metrics: None,
        }
    }

    /// Expose `metrics` through the `metrics` command. It should be the backend the orchestrator reports to.
    pub fn with_metrics(mut self, metrics: PrometheusMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[async_trait]
impl ShellHandler for EngineAdapter {
    async fn switch_group(&self, id: GroupId) -> Result<GroupId, ShellError> {
        Ok(self.registry.create_or_switch(id)?.id())
    }

    async fn set_group_limit(&self, limit: Duration) -> Result<GroupId, ShellError> {
        Ok(self.registry.set_group_deadline(Some(limit))?)
    }

    async fn set_component_limit(&self, slot: Slot, limit: Duration) -> Result<(), ShellError> {
        Ok(self.registry.set_component_deadline(slot, Some(limit))?)
    }

    async fn add_component(&self, symbol: char) -> Result<(Slot, Symbol), ShellError> {
        let (_, slot, symbol) = self.registry.add_component(symbol)?;
        Ok((slot, symbol))
    }

    async fn run(&self, argument: Argument) -> Result<RunStarted, ShellError> {
        let group = self.registry.current()?;
        let deadline = group.deadline();
        let report = self.orchestrator.run(&group, argument).await?;
        debug!(group = group.id(), scheduled = report.scheduled.len(), "run dispatched");
        Ok(RunStarted { deadline, report })
    }

    async fn status(&self, slot: Slot) -> Result<ComponentStatus, ShellError> {
        Ok(self.registry.status(slot)?)
    }

    async fn summary(&self) -> Result<(GroupId, Vec<ComponentInfo>), ShellError> {
        Ok(self.registry.summary()?)
    }

    async fn toggle_interactive(&self) -> DeliveryMode {
        self.orchestrator.notifier().toggle()
    }

    async fn metrics(&self) -> Result<String, ShellError> {
        let metrics = self
            .metrics
            .as_ref()
            .ok_or_else(|| ShellError::Metrics("no metrics backend attached".into()))?;
        metrics
            .encode_text()
            .map_err(|e| ShellError::Metrics(e.to_string()))
    }
}
