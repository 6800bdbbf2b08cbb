use std::net::SocketAddr;

use thiserror::Error;

use crate::proto::ProtoError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("failed to bind endpoint {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("endpoint block {base}+{count} does not fit in the port range")]
    PortRange { base: u16, count: usize },
    #[error("no endpoints configured")]
    NoEndpoints,
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Io(e.to_string())
    }
}
