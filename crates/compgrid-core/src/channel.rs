use std::{io, net::SocketAddr};

use futures_util::{SinkExt, StreamExt};
use tokio::{io::AsyncWriteExt, net::TcpStream, time::sleep};
use tokio_util::codec::Framed;
use tracing::{debug, instrument, trace, warn};

use compgrid_model::{Argument, Slot, Symbol};
use compgrid_service::{ClientCodec, Request, Response};

use crate::{
    error::{CoreError, CoreResult},
    retry::RetryPolicy,
};

/// Exclusively owned connection from one component to its service endpoint.
///
/// A channel serves exactly one run. [`Channel::close`] consumes it, so it is released once.
pub struct Channel {
    slot: Slot,
    peer: SocketAddr,
    framed: Framed<TcpStream, ClientCodec>,
}

impl Channel {
    /// Open a channel to `addr`, retrying transient connect failures per `policy`.
    ///
    /// Once the attempts are spent the error is [`CoreError::ConnectionExhausted`].
    /// Failures that retrying cannot fix are returned right away as [`CoreError::Io`].
    #[instrument(level = "debug", skip(policy), fields(attempts = policy.effective_attempts()))]
    pub async fn connect(slot: Slot, addr: SocketAddr, policy: &RetryPolicy) -> CoreResult<Self> {
        let attempts = policy.effective_attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(attempt, "channel opened");
                    return Ok(Self {
                        slot,
                        peer: addr,
                        framed: Framed::new(stream, ClientCodec),
                    });
                }
                Err(e) if !is_transient(&e) => return Err(CoreError::Io(e.to_string())),
                Err(e) if attempt >= attempts => {
                    return Err(CoreError::ConnectionExhausted {
                        slot,
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = policy.delay_after(attempt);
                    warn!(attempt, ?delay, error = %e, "connect attempt failed, retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one `(argument, symbol)` request and wait for its answer.
    pub async fn request(&mut self, argument: Argument, symbol: Symbol) -> CoreResult<f64> {
        trace!(slot = self.slot, argument, %symbol, "sending request");
        self.framed.send(Request::new(argument, symbol)).await?;

        match self.framed.next().await {
            Some(Ok(Response::Value(value))) => Ok(value),
            Some(Ok(Response::Rejected(rejection))) => Err(CoreError::Protocol(rejection.to_string())),
            Some(Err(e)) => Err(e.into()),
            None => Err(CoreError::Io("connection closed by service".into())),
        }
    }

    /// Shut the write half down and drop the socket.
    pub async fn close(mut self) {
        if let Err(e) = self.framed.get_mut().shutdown().await {
            trace!(slot = self.slot, error = %e, "shutdown on close failed");
        }
        trace!(slot = self.slot, peer = %self.peer, "channel closed");
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
    )
}
