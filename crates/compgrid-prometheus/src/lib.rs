//! Prometheus metrics backend for the orchestration engine.
//!
//! [`PrometheusMetrics`] implements [`compgrid_core::MetricsBackend`] on a private [`Registry`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use compgrid_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: compgrid_core::MetricsHandle = Arc::new(metrics.clone());
//! // hand `handle` to `Orchestrator::with_metrics`, then later:
//! let text = metrics.encode_text()?;
//! assert!(text.is_empty() || text.contains("compgrid_"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `compgrid_runs_total` - Counter
//! - `compgrid_components_started_total{symbol}` - Counter
//! - `compgrid_components_settled_total{symbol, outcome}` - Counter
//! - `compgrid_component_duration_seconds{symbol}` - Histogram
//! - `compgrid_connect_exhausted_total` - Counter
//!
//! No HTTP endpoint is provided; the shell prints [`PrometheusMetrics::encode_text`].

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
