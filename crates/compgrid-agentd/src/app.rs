use std::{io::Write, sync::Arc};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use compgrid_core::{
    GroupRegistry, MetricsHandle, NotificationQueue, NotificationSink, Orchestrator, StdoutSink,
};
use compgrid_exec::{BackendFactory, compare};
use compgrid_model::format_result;
use compgrid_observe::LogSink;
use compgrid_prometheus::PrometheusMetrics;
use compgrid_service::{CalcService, ServiceHandle};
use compgrid_shell::{CommandProcessor, EngineAdapter};

use crate::cli::{Cli, CompareArgs};

/// Bind every endpoint and start serving. Failing to bind is the one fatal startup error.
async fn start_service(cli: &Cli) -> Result<ServiceHandle> {
    let cfg = cli.service_config();
    let service = CalcService::bind(&cfg)
        .await
        .with_context(|| format!("failed to start calculation service on {}:{}", cfg.host, cfg.base_port))?;
    Ok(service.spawn(CancellationToken::new()))
}

pub async fn shell(cli: &Cli) -> Result<()> {
    let service = start_service(cli).await?;
    let endpoints = service.endpoints().clone();

    let sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(StdoutSink), Arc::new(LogSink::new())];
    let queue = Arc::new(NotificationQueue::new(sinks));
    let metrics = PrometheusMetrics::new().context("failed to register metrics")?;

    let orchestrator = Arc::new(
        Orchestrator::new(endpoints.clone(), queue)
            .with_retry(cli.retry_policy())
            .with_metrics(Arc::new(metrics.clone()) as MetricsHandle),
    );
    let registry = Arc::new(GroupRegistry::new(endpoints.len()));
    let adapter = EngineAdapter::new(registry, Arc::clone(&orchestrator)).with_metrics(metrics);
    let processor = CommandProcessor::new(Arc::new(adapter));

    say(&["Task manager started. Enter commands (help for a list):".to_string()]);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                let reply = processor.process(&line).await;
                say(&reply.lines);
                if reply.exit {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read from stdin");
                break;
            }
        }
    }

    orchestrator.shutdown();
    service.shutdown().await;
    Ok(())
}

pub async fn serve(cli: &Cli) -> Result<()> {
    let service = start_service(cli).await?;
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("interrupted");
    service.shutdown().await;
    Ok(())
}

pub async fn compare_backends(cli: &Cli, args: &CompareArgs) -> Result<()> {
    let service = start_service(cli).await?;
    let factory = BackendFactory::new(service.endpoints().clone(), cli.service_config().pacing)
        .with_retry(cli.retry_policy());

    let results = compare(&factory, args.symbol, args.input, args.count).await;
    service.shutdown().await;

    let lines: Vec<String> = results?
        .into_iter()
        .map(|c| match c.outcome {
            Ok(value) => format!(
                "Component {} [{}] {}({}) = {} in {:?}",
                c.slot,
                c.kind,
                args.symbol,
                args.input,
                format_result(value),
                c.elapsed
            ),
            Err(e) => format!("Component {} [{}] failed: {}", c.slot, c.kind, e),
        })
        .collect();
    say(&lines);
    Ok(())
}

fn say(lines: &[String]) {
    let mut out = std::io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
}
