use std::{
    collections::BTreeMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use compgrid_model::{Argument, GroupId, Notification, Slot, Symbol};
use compgrid_service::Endpoints;

use crate::{
    channel::Channel,
    component::Settler,
    error::{CoreError, CoreResult},
    group::Group,
    metrics::{MetricsHandle, Outcome, noop_metrics},
    notify::NotificationQueue,
    retry::RetryPolicy,
};

/// A component that could not be reconnected and is left out of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedComponent {
    pub slot: Slot,
    pub symbol: Symbol,
    pub error: CoreError,
}

/// What `run` scheduled. Results arrive later through the notification queue.
#[derive(Debug)]
pub struct RunReport {
    pub group: GroupId,
    pub argument: Argument,
    /// Slots with a task in flight, ascending.
    pub scheduled: Vec<Slot>,
    /// Components left out of this run, ascending by slot.
    pub skipped: Vec<SkippedComponent>,
    completion: JoinHandle<()>,
}

impl RunReport {
    /// Every component the run tried to reconnect.
    pub fn attempted(&self) -> usize {
        self.scheduled.len() + self.skipped.len()
    }

    pub fn is_finished(&self) -> bool {
        self.completion.is_finished()
    }

    /// Wait until every task settled and the group completion notification went out.
    pub async fn finished(self) {
        if let Err(e) = self.completion.await {
            error!(group = self.group, error = %e, "group watcher ended abnormally");
        }
    }
}

/// Dispatches the components of a group to the calculation service.
pub struct Orchestrator {
    endpoints: Endpoints,
    retry: RetryPolicy,
    notifier: Arc<NotificationQueue>,
    metrics: MetricsHandle,
    cancel: CancellationToken,
}

struct Job {
    slot: Slot,
    symbol: Symbol,
    deadline: Option<Duration>,
    channel: Channel,
    settler: Settler,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(endpoints: Endpoints, notifier: Arc<NotificationQueue>) -> Self {
        Self {
            endpoints,
            retry: RetryPolicy::default(),
            notifier,
            metrics: noop_metrics(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn notifier(&self) -> &Arc<NotificationQueue> {
        &self.notifier
    }

    /// Run every component of `group` with `argument`.
    ///
    /// Returns once all channels are (re)opened and the tasks are scheduled. Components that cannot
    /// be reconnected are left out of the new component map and listed in the report.
    #[instrument(level = "debug", skip(self, group), fields(group = group.id()))]
    pub async fn run(&self, group: &Arc<Group>, argument: Argument) -> CoreResult<RunReport> {
        group.begin_run()?;
        let mut guard = RunGuard {
            group: &**group,
            armed: true,
        };
        self.metrics.run_started(group.id());

        let group_deadline = group.deadline();
        let mut connects = JoinSet::new();
        for component in group.successors() {
            let addr = self.endpoints.get(component.slot());
            let endpoints = self.endpoints.len();
            let retry = self.retry;
            connects.spawn(async move {
                let slot = component.slot();
                let channel = match addr {
                    Some(addr) => Channel::connect(slot, addr, &retry).await,
                    None => Err(CoreError::SlotOutOfRange { slot, endpoints }),
                };
                (component, channel)
            });
        }

        let mut connected = Vec::new();
        let mut skipped = Vec::new();
        while let Some(joined) = connects.join_next().await {
            match joined {
                Ok((component, Ok(channel))) => connected.push((component, channel)),
                Ok((component, Err(e))) => {
                    warn!(slot = component.slot(), error = %e, "component skipped, no channel");
                    self.metrics.connect_exhausted(component.slot());
                    skipped.push(SkippedComponent {
                        slot: component.slot(),
                        symbol: component.symbol(),
                        error: e,
                    });
                }
                Err(e) => error!(error = %e, "connect task ended abnormally"),
            }
        }
        connected.sort_by_key(|(c, _)| c.slot());
        skipped.sort_by_key(|s| s.slot);

        let mut fresh = BTreeMap::new();
        let mut jobs = Vec::with_capacity(connected.len());
        for (mut component, channel) in connected {
            let cancel = self.cancel.child_token();
            let settler = component.arm(cancel.clone());
            jobs.push(Job {
                slot: component.slot(),
                symbol: component.symbol(),
                deadline: component.deadline().or(group_deadline),
                channel,
                settler,
                cancel,
            });
            fresh.insert(component.slot(), component);
        }
        group.replace_components(fresh);

        let scheduled: Vec<Slot> = jobs.iter().map(|j| j.slot).collect();
        let mut tasks = JoinSet::new();
        for job in jobs {
            tasks.spawn(execute(
                job,
                argument,
                Arc::clone(&self.notifier),
                Arc::clone(&self.metrics),
            ));
        }
        info!(
            scheduled = scheduled.len(),
            skipped = skipped.len(),
            argument,
            "group run started"
        );

        guard.armed = false;
        let completion = tokio::spawn(watch_group(
            Arc::clone(group),
            tasks,
            Arc::clone(&self.notifier),
        ));

        Ok(RunReport {
            group: group.id(),
            argument,
            scheduled,
            skipped,
            completion,
        })
    }

    /// Abandon every in-flight task of every group.
    ///
    /// Terminal: runs started afterwards are abandoned as soon as they are scheduled.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Clears the running flag if `run` is dropped before the watcher takes over.
struct RunGuard<'a> {
    group: &'a Group,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.group.end_run();
        }
    }
}

async fn execute(
    job: Job,
    argument: Argument,
    notifier: Arc<NotificationQueue>,
    metrics: MetricsHandle,
) {
    let Job {
        slot,
        symbol,
        deadline,
        mut channel,
        settler,
        cancel,
    } = job;

    metrics.component_started(symbol);
    let started = Instant::now();
    let result = tokio::select! {
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
        result = bounded(deadline, channel.request(argument, symbol)) => result,
    };
    channel.close().await;
    let elapsed = started.elapsed();

    match result {
        Ok(value) => {
            settler.settle(Ok(value));
            metrics.component_settled(symbol, Outcome::Completed, elapsed);
            debug!(slot, value, ?elapsed, "component completed");
            notifier.send(Notification::component_completed(slot, value));
        }
        Err(e) if e.is_timeout() => {
            settler.settle(Err(e.to_string()));
            metrics.component_settled(symbol, Outcome::TimedOut, elapsed);
            debug!(slot, error = %e, "component timed out");
            notifier.send(Notification::component_timed_out(slot, &e));
        }
        Err(e) => {
            settler.settle(Err(e.to_string()));
            metrics.component_settled(symbol, Outcome::Failed, elapsed);
            debug!(slot, error = %e, "component failed");
            notifier.send(Notification::component_failed(slot, &e));
        }
    }
}

async fn bounded<F>(deadline: Option<Duration>, request: F) -> CoreResult<f64>
where
    F: Future<Output = CoreResult<f64>>,
{
    match deadline {
        None => request.await,
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_| CoreError::Timeout(limit))?,
    }
}

async fn watch_group(group: Arc<Group>, mut tasks: JoinSet<()>, notifier: Arc<NotificationQueue>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(group = group.id(), error = %e, "component task ended abnormally");
        }
    }
    group.end_run();
    info!(group = group.id(), "group run completed");
    notifier.send(Notification::group_completed(group.id()));
}
