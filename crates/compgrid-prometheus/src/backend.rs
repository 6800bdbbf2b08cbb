use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
    exponential_buckets, proto::MetricFamily,
};
use tracing::trace;

use compgrid_core::{MetricsBackend, Outcome};
use compgrid_model::{GroupId, Slot, Symbol};

/// Orchestrator metrics kept in their own registry. Clones share the same series.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    runs: IntCounter,
    started: IntCounterVec,
    settled: IntCounterVec,
    duration: HistogramVec,
    exhausted: IntCounter,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let runs = IntCounter::with_opts(Opts::new("compgrid_runs_total", "Group runs started"))?;
        let started = IntCounterVec::new(
            Opts::new(
                "compgrid_components_started_total",
                "Component requests dispatched",
            ),
            &["symbol"],
        )?;
        let settled = IntCounterVec::new(
            Opts::new(
                "compgrid_components_settled_total",
                "Component requests settled, by outcome",
            ),
            &["symbol", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "compgrid_component_duration_seconds",
                "Time from dispatch to settlement",
            )
            .buckets(exponential_buckets(0.005, 2.0, 16)?),
            &["symbol"],
        )?;
        let exhausted = IntCounter::with_opts(Opts::new(
            "compgrid_connect_exhausted_total",
            "Components skipped because their endpoint could not be reached",
        ))?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(started.clone()))?;
        registry.register(Box::new(settled.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(exhausted.clone()))?;

        Ok(Self {
            registry,
            runs,
            started,
            settled,
            duration,
            exhausted,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format of every series.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn run_started(&self, group: GroupId) {
        trace!(group, "run counted");
        self.runs.inc();
    }

    fn component_started(&self, symbol: Symbol) {
        self.started.with_label_values(&[symbol.name()]).inc();
    }

    fn component_settled(&self, symbol: Symbol, outcome: Outcome, elapsed: Duration) {
        self.settled
            .with_label_values(&[symbol.name(), outcome.as_label()])
            .inc();
        self.duration
            .with_label_values(&[symbol.name()])
            .observe(elapsed.as_secs_f64());
    }

    fn connect_exhausted(&self, slot: Slot) {
        trace!(slot, "exhausted connect counted");
        self.exhausted.inc();
    }
}
