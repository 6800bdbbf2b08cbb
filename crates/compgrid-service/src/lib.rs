//! The calculation service: a fixed block of TCP endpoints answering `(input, symbol)` requests with a double.
//!
//! The crate also owns the wire protocol, so callers use the same codec types the listeners do.

mod error;
pub use error::{ServiceError, ServiceResult};

pub mod calc;
pub use calc::{Pacing, PacingTable, evaluate};

pub mod proto;
pub use proto::{ClientCodec, ProtoError, Rejection, Request, Response, ServiceCodec};

mod endpoints;
pub use endpoints::Endpoints;

mod config;
pub use config::{DEFAULT_BASE_PORT, DEFAULT_ENDPOINTS, ServiceConfig};

mod server;
pub use server::{CalcService, ServiceHandle};

pub mod prelude {
    pub use crate::error::{ServiceError, ServiceResult};
    pub use crate::{CalcService, Endpoints, PacingTable, ServiceConfig, ServiceHandle};
}
