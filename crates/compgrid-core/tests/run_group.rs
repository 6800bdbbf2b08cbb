use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_util::{codec::Framed, sync::CancellationToken};

use compgrid_core::{
    CoreError, DeliveryMode, GroupRegistry, MemorySink, NotificationQueue, Orchestrator,
    RetryPolicy,
};
use compgrid_model::{ComponentStatus, NotificationKind, Symbol};
use compgrid_service::{
    CalcService, Endpoints, Pacing, PacingTable, Rejection, Response, ServiceCodec, ServiceHandle,
};

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

struct Harness {
    service: ServiceHandle,
    registry: GroupRegistry,
    orchestrator: Orchestrator,
    queue: Arc<NotificationQueue>,
    sink: Arc<MemorySink>,
}

impl Harness {
    /// `live` listening endpoints followed by `dead` addresses nobody listens on.
    async fn start(live: usize, dead: usize, pacing: PacingTable) -> Self {
        let service = CalcService::bind_endpoints(
            &Endpoints::from_addrs(vec![SocketAddr::new(LOCALHOST, 0); live]),
            pacing,
        )
        .await
        .unwrap();

        let mut addrs: Vec<SocketAddr> = service.endpoints().iter().map(|(_, a)| a).collect();
        for _ in 0..dead {
            addrs.push(refused_addr().await);
        }
        let endpoints = Endpoints::from_addrs(addrs);
        let service = service.spawn(CancellationToken::new());

        let sink = Arc::new(MemorySink::new());
        let queue = Arc::new(NotificationQueue::new(vec![sink.clone()]));
        let orchestrator = Orchestrator::new(endpoints.clone(), Arc::clone(&queue))
            .with_retry(RetryPolicy::fixed(3, Duration::from_millis(20)));

        Self {
            service,
            registry: GroupRegistry::new(endpoints.len()),
            orchestrator,
            queue,
            sink,
        }
    }

    async fn stop(self) {
        self.orchestrator.shutdown();
        self.service.shutdown().await;
    }
}

async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_components_are_dropped_from_the_run() {
    let h = Harness::start(3, 2, PacingTable::instant()).await;
    let group = h.registry.create_or_switch(1).unwrap();
    for c in ['F', 'B', 'P', 'S', 'F'] {
        h.registry.add_component(c).unwrap();
    }

    let report = h.orchestrator.run(&group, 5).await.unwrap();
    assert_eq!(report.attempted(), 5);
    assert_eq!(report.scheduled, vec![0, 1, 2]);
    let skipped: Vec<_> = report.skipped.iter().map(|s| s.slot).collect();
    assert_eq!(skipped, vec![3, 4]);
    assert!(report.skipped.iter().all(|s| matches!(
        s.error,
        CoreError::ConnectionExhausted { attempts: 3, .. }
    )));
    report.finished().await;

    let (_, infos) = h.registry.summary().unwrap();
    let slots: Vec<_> = infos.iter().map(|i| i.slot).collect();
    assert_eq!(slots, vec![0, 1, 2]);
    assert!(infos.iter().all(|i| i.status == ComponentStatus::Completed));
    assert_eq!(infos[0].result, Some(120.0));
    assert_eq!(infos[1].result, Some(5.0));
    assert_eq!(infos[2].result, Some(1.0));
    assert_eq!(h.registry.status(3), Err(CoreError::ComponentNotFound(3)));
    assert!(!group.is_running());

    let messages = h.sink.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages.last().map(String::as_str), Some("Group 1 completed"));
    assert!(messages.contains(&"Component 0 completed with result: 120.0".to_string()));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn group_deadline_fails_only_the_slow_component() {
    let slow_factorial = PacingTable::instant().with(
        Symbol::Factorial,
        Pacing::new(Duration::from_millis(800), Duration::ZERO, Duration::ZERO),
    );
    let h = Harness::start(2, 0, slow_factorial).await;
    let group = h.registry.create_or_switch(2).unwrap();
    h.registry.add_component('F').unwrap();
    h.registry.add_component('B').unwrap();
    h.registry.set_group_deadline(Some(Duration::from_millis(200))).unwrap();

    let report = h.orchestrator.run(&group, 10).await.unwrap();
    report.finished().await;

    assert_eq!(h.registry.status(0).unwrap(), ComponentStatus::Failed);
    assert_eq!(h.registry.status(1).unwrap(), ComponentStatus::Completed);
    assert_eq!(h.registry.component(1).unwrap().result, Some(55.0));

    let notes = h.sink.notifications();
    let timed_out: Vec<_> = notes
        .iter()
        .filter(|n| n.kind == NotificationKind::ComponentTimedOut)
        .collect();
    assert_eq!(timed_out.len(), 1);
    assert_eq!(
        timed_out[0].message,
        "Component 0 failed due to time limit: timed out after 200ms"
    );
    assert_eq!(notes.last().unwrap().kind, NotificationKind::GroupCompleted);

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn component_deadline_overrides_group_deadline() {
    let slow_primality = PacingTable::instant().with(
        Symbol::Primality,
        Pacing::new(Duration::from_millis(300), Duration::ZERO, Duration::ZERO),
    );
    let h = Harness::start(2, 0, slow_primality).await;
    let group = h.registry.create_or_switch(1).unwrap();
    h.registry.add_component('P').unwrap();
    h.registry.add_component('P').unwrap();
    h.registry.set_group_deadline(Some(Duration::from_millis(100))).unwrap();
    h.registry.set_component_deadline(1, Some(Duration::from_secs(5))).unwrap();

    h.orchestrator.run(&group, 7).await.unwrap().finished().await;

    assert_eq!(h.registry.status(0).unwrap(), ComponentStatus::Failed);
    assert_eq!(h.registry.status(1).unwrap(), ComponentStatus::Completed);
    assert_eq!(h.registry.component(1).unwrap().result, Some(1.0));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deferred_notifications_flush_in_generation_order() {
    let h = Harness::start(2, 0, PacingTable::instant()).await;
    let group = h.registry.create_or_switch(4).unwrap();
    h.registry.add_component('F').unwrap();
    h.registry.add_component('S').unwrap();

    assert_eq!(h.queue.toggle(), DeliveryMode::Deferred);
    h.orchestrator.run(&group, 4).await.unwrap().finished().await;
    assert!(h.sink.is_empty());
    assert_eq!(h.queue.pending(), 3);

    assert_eq!(h.queue.toggle(), DeliveryMode::Immediate);
    let notes = h.sink.notifications();
    assert_eq!(notes.len(), 3);
    assert!(notes.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(notes[2].message, "Group 4 completed");

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn summary_shows_not_available_until_settled() {
    let slow_primality = PacingTable::instant().with(
        Symbol::Primality,
        Pacing::new(Duration::from_millis(300), Duration::ZERO, Duration::ZERO),
    );
    let h = Harness::start(1, 0, slow_primality).await;
    let group = h.registry.create_or_switch(1).unwrap();
    h.registry.add_component('P').unwrap();

    let report = h.orchestrator.run(&group, 7).await.unwrap();
    let (_, during) = h.registry.summary().unwrap();
    assert_eq!(during[0].status, ComponentStatus::Running);
    assert_eq!(during[0].result_label(), "N/A");
    assert!(group.is_running());

    report.finished().await;
    let (_, after) = h.registry.summary().unwrap();
    assert_eq!(after[0].status, ComponentStatus::Completed);
    assert_eq!(after[0].result_label(), "1.0");

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_run_is_rejected_and_rerun_starts_fresh() {
    let slow_fibonacci = PacingTable::instant().with(
        Symbol::Fibonacci,
        Pacing::new(Duration::from_millis(200), Duration::ZERO, Duration::ZERO),
    );
    let h = Harness::start(1, 0, slow_fibonacci).await;
    let group = h.registry.create_or_switch(1).unwrap();
    h.registry.add_component('B').unwrap();

    let first = h.orchestrator.run(&group, 10).await.unwrap();
    assert!(matches!(
        h.orchestrator.run(&group, 10).await,
        Err(CoreError::GroupRunning(1))
    ));
    first.finished().await;
    assert_eq!(h.registry.component(0).unwrap().result, Some(55.0));

    let second = h.orchestrator.run(&group, 6).await.unwrap();
    assert_eq!(h.registry.status(0).unwrap(), ComponentStatus::Running);
    second.finished().await;
    assert_eq!(h.registry.component(0).unwrap().result, Some(8.0));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_abandons_in_flight_components() {
    let slow_root = PacingTable::instant().with(
        Symbol::SquareRoot,
        Pacing::new(Duration::from_millis(500), Duration::ZERO, Duration::ZERO),
    );
    let h = Harness::start(1, 0, slow_root).await;
    let group = h.registry.create_or_switch(1).unwrap();
    h.registry.add_component('S').unwrap();

    let report = h.orchestrator.run(&group, 9).await.unwrap();
    h.orchestrator.shutdown();
    report.finished().await;

    let info = h.registry.component(0).unwrap();
    assert_eq!(info.status, ComponentStatus::Failed);
    assert_eq!(info.error.as_deref(), Some("cancelled"));
    assert!(h.sink.messages().contains(&"Component 0 failed: cancelled".to_string()));

    h.stop().await;
}

#[tokio::test]
async fn empty_group_completes_immediately() {
    let h = Harness::start(1, 0, PacingTable::instant()).await;
    let group = h.registry.create_or_switch(8).unwrap();

    let report = h.orchestrator.run(&group, 5).await.unwrap();
    assert_eq!(report.attempted(), 0);
    report.finished().await;
    assert_eq!(h.sink.messages(), vec!["Group 8 completed"]);

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn component_map_cannot_change_during_a_run() {
    let h = Harness::start(1, 1, PacingTable::instant()).await;
    let group = h.registry.create_or_switch(1).unwrap();
    h.registry.add_component('F').unwrap();
    h.registry.add_component('B').unwrap();

    // slot 1 is unreachable, so the connect phase spans the retry pauses
    let (report, during) = tokio::join!(h.orchestrator.run(&group, 5), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        (
            h.registry.add_component('P'),
            h.registry.set_component_deadline(0, Some(Duration::from_secs(1))),
        )
    });
    assert_eq!(during.0, Err(CoreError::GroupRunning(1)));
    assert_eq!(during.1, Err(CoreError::GroupRunning(1)));
    report.unwrap().finished().await;

    let (_, infos) = h.registry.summary().unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].deadline_secs, None);
    assert_eq!(
        h.registry.add_component('P').unwrap(),
        (1, 1, Symbol::Primality)
    );

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rejected_request_fails_the_component() {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rejecting = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, ServiceCodec);
        while let Some(Ok(request)) = framed.next().await {
            let rejection = Rejection::UnknownSymbol(request.symbol);
            if framed.send(Response::Rejected(rejection)).await.is_err() {
                break;
            }
        }
    });

    let sink = Arc::new(MemorySink::new());
    let queue = Arc::new(NotificationQueue::new(vec![sink.clone()]));
    let endpoints = Endpoints::from_addrs(vec![addr]);
    let orchestrator = Orchestrator::new(endpoints, queue);
    let registry = GroupRegistry::new(1);
    let group = registry.create_or_switch(5).unwrap();
    registry.add_component('F').unwrap();

    orchestrator.run(&group, 3).await.unwrap().finished().await;

    let info = registry.component(0).unwrap();
    assert_eq!(info.status, ComponentStatus::Failed);
    assert_eq!(info.result, None);
    assert_eq!(
        sink.messages(),
        vec![
            "Component 0 failed: protocol error: unknown symbol 'F'",
            "Group 5 completed",
        ]
    );

    rejecting.await.unwrap();
}
