use std::{net::SocketAddr, sync::Arc};

use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinSet,
};
use tokio_util::{codec::Framed, sync::CancellationToken};
use tracing::{debug, error, info, instrument, trace, warn};

use compgrid_model::Slot;

use crate::{
    Endpoints, PacingTable, ServiceConfig,
    calc::evaluate,
    error::{ServiceError, ServiceResult},
    proto::{Response, ServiceCodec},
};

/// Bound but not yet serving calculation service.
///
/// Binding is all-or-nothing: if one endpoint cannot be bound, none are kept and the caller gets [`ServiceError::Bind`].
pub struct CalcService {
    listeners: Vec<TcpListener>,
    endpoints: Endpoints,
    pacing: Arc<PacingTable>,
}

impl CalcService {
    pub async fn bind(cfg: &ServiceConfig) -> ServiceResult<Self> {
        Self::bind_endpoints(&cfg.endpoints()?, cfg.pacing).await
    }

    /// Bind every address of `endpoints`.
    ///
    /// Addresses with port `0` get an ephemeral port; [`CalcService::endpoints`] reports the resolved map.
    #[instrument(level = "debug", skip_all, fields(count = endpoints.len()))]
    pub async fn bind_endpoints(endpoints: &Endpoints, pacing: PacingTable) -> ServiceResult<Self> {
        if endpoints.is_empty() {
            return Err(ServiceError::NoEndpoints);
        }

        let mut listeners = Vec::with_capacity(endpoints.len());
        let mut resolved = Vec::with_capacity(endpoints.len());
        for (slot, addr) in endpoints.iter() {
            let listener = TcpListener::bind(addr)
                .await
                .map_err(|source| ServiceError::Bind { addr, source })?;
            let local = listener.local_addr()?;
            trace!(slot, %local, "endpoint bound");

            resolved.push(local);
            listeners.push(listener);
        }

        Ok(Self {
            listeners,
            endpoints: Endpoints::from_addrs(resolved),
            pacing: Arc::new(pacing),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Start one accept loop per endpoint.
    ///
    /// The loops, and every connection they accepted, stop when `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> ServiceHandle {
        let mut loops = JoinSet::new();
        for (slot, listener) in self.listeners.into_iter().enumerate() {
            loops.spawn(accept_loop(
                slot,
                listener,
                Arc::clone(&self.pacing),
                cancel.clone(),
            ));
        }

        if let (Some(first), Some(last)) = (
            self.endpoints.get(0),
            self.endpoints.get(self.endpoints.len() - 1),
        ) {
            info!(first = %first, last = %last, "calculation service started");
        }

        ServiceHandle {
            endpoints: self.endpoints,
            cancel,
            loops,
        }
    }
}

/// Running calculation service.
pub struct ServiceHandle {
    endpoints: Endpoints,
    cancel: CancellationToken,
    loops: JoinSet<()>,
}

impl ServiceHandle {
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Stop accepting, close every open connection and wait for the accept loops.
    ///
    /// A computation already running on a blocking thread is not interrupted; it finishes and its result is dropped.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while let Some(joined) = self.loops.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "accept loop ended abnormally");
            }
        }
        info!("calculation service stopped");
    }
}

async fn accept_loop(
    slot: Slot,
    listener: TcpListener,
    pacing: Arc<PacingTable>,
    cancel: CancellationToken,
) {
    debug!(slot, "accept loop started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    trace!(slot, %peer, "client connected");
                    tokio::spawn(serve_connection(
                        slot,
                        stream,
                        peer,
                        Arc::clone(&pacing),
                        cancel.child_token(),
                    ));
                }
                Err(e) => warn!(slot, error = %e, "accept failed"),
            },
        }
    }
    debug!(slot, "accept loop stopped");
}

/// One request at a time, until the peer closes the stream or the service stops.
async fn serve_connection(
    slot: Slot,
    stream: TcpStream,
    peer: SocketAddr,
    pacing: Arc<PacingTable>,
    cancel: CancellationToken,
) {
    let mut framed = Framed::new(stream, ServiceCodec);
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = framed.next() => frame,
        };

        let request = match frame {
            None => {
                trace!(slot, %peer, "peer closed connection");
                break;
            }
            Some(Err(e)) => {
                error!(slot, %peer, error = %e, "client handling error");
                break;
            }
            Some(Ok(request)) => request,
        };

        let response = match request.symbol() {
            Err(rejection) => {
                warn!(slot, %peer, %rejection, "request rejected");
                Response::Rejected(rejection)
            }
            Ok(symbol) => {
                trace!(slot, %peer, input = request.input, %symbol, "request received");
                let pacing = Arc::clone(&pacing);
                let input = request.input;
                match tokio::task::spawn_blocking(move || evaluate(symbol, input, &pacing)).await {
                    Ok(value) => Response::Value(value),
                    Err(e) => {
                        error!(slot, %peer, error = %e, "calculation task failed");
                        break;
                    }
                }
            }
        };

        if let Err(e) = framed.send(response).await {
            debug!(slot, %peer, error = %e, "failed to write response");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::{IpAddr, Ipv4Addr},
        time::Duration,
    };

    use compgrid_model::Symbol;

    use super::*;
    use crate::{
        Pacing,
        proto::{ClientCodec, Rejection, Request},
    };

    fn ephemeral(count: usize) -> Endpoints {
        Endpoints::from_addrs(vec![
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
            count
        ])
    }

    async fn start(count: usize, pacing: PacingTable) -> ServiceHandle {
        CalcService::bind_endpoints(&ephemeral(count), pacing)
            .await
            .expect("bind")
            .spawn(CancellationToken::new())
    }

    async fn connect(handle: &ServiceHandle, slot: Slot) -> Framed<TcpStream, ClientCodec> {
        let addr = handle.endpoints().get(slot).expect("slot");
        Framed::new(TcpStream::connect(addr).await.expect("connect"), ClientCodec)
    }

    async fn ask(client: &mut Framed<TcpStream, ClientCodec>, req: Request) -> Response {
        client.send(req).await.expect("send");
        client.next().await.expect("response").expect("decode")
    }

    #[tokio::test]
    async fn answers_every_kind_on_one_connection() {
        let handle = start(1, PacingTable::instant()).await;
        let mut client = connect(&handle, 0).await;

        let cases = [
            (Symbol::Factorial, 5, 120.0),
            (Symbol::Fibonacci, 10, 55.0),
            (Symbol::Primality, 7, 1.0),
            (Symbol::Primality, 8, 0.0),
        ];
        for (symbol, input, expected) in cases {
            let resp = ask(&mut client, Request::new(input, symbol)).await;
            assert_eq!(resp, Response::Value(expected), "{symbol}({input})");
        }

        match ask(&mut client, Request::new(2, Symbol::SquareRoot)).await {
            Response::Value(v) => assert!((v - 2f64.sqrt()).abs() < 1e-4),
            other => panic!("unexpected {other:?}"),
        }

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_symbol_keeps_the_connection() {
        let handle = start(1, PacingTable::instant()).await;
        let mut client = connect(&handle, 0).await;

        let resp = ask(&mut client, Request::raw(3, u16::from(b'X'))).await;
        assert_eq!(
            resp,
            Response::Rejected(Rejection::UnknownSymbol(u16::from(b'X')))
        );

        let resp = ask(&mut client, Request::new(3, Symbol::Factorial)).await;
        assert_eq!(resp, Response::Value(6.0));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn each_slot_has_its_own_endpoint() {
        let handle = start(3, PacingTable::instant()).await;
        let addrs: Vec<_> = handle.endpoints().iter().map(|(_, a)| a).collect();
        assert_eq!(addrs.len(), 3);
        assert!(addrs.iter().all(|a| a.port() != 0));

        let mut last = connect(&handle, 2).await;
        assert_eq!(
            ask(&mut last, Request::new(4, Symbol::Fibonacci)).await,
            Response::Value(3.0)
        );
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn connections_are_served_in_parallel() {
        let slow = Pacing::new(Duration::from_millis(300), Duration::ZERO, Duration::ZERO);
        let handle = start(1, PacingTable::instant().with(Symbol::Primality, slow)).await;

        let mut a = connect(&handle, 0).await;
        let mut b = connect(&handle, 0).await;

        let started = std::time::Instant::now();
        let (ra, rb) = tokio::join!(
            ask(&mut a, Request::new(7, Symbol::Primality)),
            ask(&mut b, Request::new(9, Symbol::Primality)),
        );
        assert_eq!(ra, Response::Value(1.0));
        assert_eq!(rb, Response::Value(0.0));
        assert!(started.elapsed() < Duration::from_millis(550));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn second_bind_on_a_taken_port_fails() {
        let handle = start(1, PacingTable::instant()).await;
        let taken = handle.endpoints().clone();

        let err = CalcService::bind_endpoints(&taken, PacingTable::instant()).await;
        assert!(matches!(err, Err(ServiceError::Bind { .. })));

        handle.shutdown().await;
    }
}
