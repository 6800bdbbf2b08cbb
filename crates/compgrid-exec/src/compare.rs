use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{error, info};

use compgrid_model::{Argument, Slot, Symbol};

use crate::{
    backend::BackendKind,
    error::ExecResult,
    rotation::{BackendFactory, BackendRotation},
};

/// How one backend fared on the shared workload.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub slot: Slot,
    pub kind: BackendKind,
    pub elapsed: Duration,
    pub outcome: ExecResult<f64>,
}

/// Run `symbol(input)` on `count` backends handed out by a fresh rotation, all at once.
///
/// Results are ordered by slot.
pub async fn compare(
    factory: &BackendFactory,
    symbol: Symbol,
    input: Argument,
    count: usize,
) -> ExecResult<Vec<Comparison>> {
    let rotation = BackendRotation::new();
    let mut backends = Vec::with_capacity(count);
    for slot in 0..count {
        backends.push(factory.build(rotation.next_kind(), slot, symbol)?);
    }

    let mut runs = JoinSet::new();
    for backend in backends {
        runs.spawn(async move {
            let started = Instant::now();
            let outcome = match backend.compute(input).await {
                Ok(()) => backend.outcome().await,
                Err(e) => Err(e),
            };
            let elapsed = started.elapsed();
            backend.shutdown().await;
            Comparison {
                slot: backend.slot(),
                kind: backend.kind(),
                elapsed,
                outcome,
            }
        });
    }

    let mut results = Vec::with_capacity(count);
    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok(c) => {
                info!(slot = c.slot, kind = %c.kind, elapsed = ?c.elapsed, ok = c.outcome.is_ok(), "backend finished");
                results.push(c);
            }
            Err(e) => error!(error = %e, "backend run ended abnormally"),
        }
    }
    results.sort_by_key(|c| c.slot);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use tokio_util::sync::CancellationToken;

    use compgrid_service::{CalcService, Endpoints, Pacing, PacingTable};

    use crate::{ExecBackend, ExecError, QueueBackend, TaskBackend};

    use super::*;

    async fn service(count: usize, pacing: PacingTable) -> (compgrid_service::ServiceHandle, Endpoints) {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let service = CalcService::bind_endpoints(&Endpoints::from_addrs(vec![addr; count]), pacing)
            .await
            .unwrap();
        let endpoints = service.endpoints().clone();
        (service.spawn(CancellationToken::new()), endpoints)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_backend_agrees_on_the_value() {
        let (handle, endpoints) = service(6, PacingTable::instant()).await;
        let factory = BackendFactory::new(endpoints, PacingTable::instant());

        let results = compare(&factory, Symbol::Factorial, 5, 6).await.unwrap();
        assert_eq!(results.len(), 6);
        let kinds: Vec<_> = results.iter().map(|c| c.kind).collect();
        assert_eq!(&kinds[..3], &BackendKind::ALL);
        assert!(results.iter().all(|c| c.outcome == Ok(120.0)));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn outcome_before_compute_is_not_started() {
        let pacing = std::sync::Arc::new(PacingTable::instant());
        let backend = TaskBackend::new(0, Symbol::Fibonacci, pacing);
        assert!(!backend.is_finished());
        assert_eq!(backend.outcome().await, Err(ExecError::NotStarted));
    }

    #[tokio::test]
    async fn busy_backend_rejects_a_second_compute() {
        let pacing = std::sync::Arc::new(PacingTable::instant().with(
            Symbol::Primality,
            Pacing::new(Duration::from_millis(200), Duration::ZERO, Duration::ZERO),
        ));
        let backend = QueueBackend::new(0, Symbol::Primality, pacing);

        backend.compute(7).await.unwrap();
        assert_eq!(backend.compute(8).await, Err(ExecError::Busy));
        assert_eq!(backend.outcome().await, Ok(1.0));
        assert!(backend.is_finished());

        backend.compute(8).await.unwrap();
        assert_eq!(backend.outcome().await, Ok(0.0));

        backend.shutdown().await;
        assert_eq!(backend.compute(9).await, Err(ExecError::ShutDown));
    }

    #[tokio::test]
    async fn shut_down_task_backend_refuses_work() {
        let backend = TaskBackend::new(0, Symbol::SquareRoot, std::sync::Arc::new(PacingTable::instant()));
        backend.compute(4).await.unwrap();
        assert!((backend.outcome().await.unwrap() - 2.0).abs() < 1e-4);
        backend.shutdown().await;
        assert_eq!(backend.compute(4).await, Err(ExecError::ShutDown));
    }
}
