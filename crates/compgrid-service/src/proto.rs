//! Fixed-size binary protocol between the orchestrator and the service.
//!
//! Request (6 bytes): `input: i32 BE`, `symbol: u16 BE` (one UTF-16 code unit).
//! Response (9 bytes): `tag: u8`, then 8 payload bytes:
//! - `0x00`: payload is the `f64` result, big-endian bits;
//! - `0x01`: the symbol was not recognized; payload holds the rejected code unit.
//!
//! A rejection terminates only that request. The connection stays open.
use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use compgrid_model::Symbol;

pub const REQUEST_LEN: usize = 6;
pub const RESPONSE_LEN: usize = 9;

const TAG_VALUE: u8 = 0x00;
const TAG_UNKNOWN_SYMBOL: u8 = 0x01;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("unknown response tag: {0:#04x}")]
    UnknownTag(u8),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One calculation request as it travels on the wire.
///
/// The symbol is kept as its raw code unit so the service can reject letters it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub input: i32,
    pub symbol: u16,
}

impl Request {
    pub fn new(input: i32, symbol: Symbol) -> Self {
        Self {
            input,
            symbol: symbol.as_char() as u16,
        }
    }

    /// Request carrying an arbitrary code unit.
    pub fn raw(input: i32, symbol: u16) -> Self {
        Self { input, symbol }
    }

    /// Resolve the calculation kind, or the rejection to send back.
    pub fn symbol(&self) -> Result<Symbol, Rejection> {
        char::from_u32(u32::from(self.symbol))
            .and_then(|c| Symbol::try_from(c).ok())
            .ok_or(Rejection::UnknownSymbol(self.symbol))
    }
}

/// Reason the service refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownSymbol(u16),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownSymbol(unit) => match char::from_u32(u32::from(*unit)) {
                Some(c) => write!(f, "unknown symbol '{c}'"),
                None => write!(f, "unknown symbol {unit:#06x}"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Value(f64),
    Rejected(Rejection),
}

/// Listener side: decodes requests, encodes responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceCodec;

/// Caller side: encodes requests, decodes responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClientCodec;

impl Decoder for ServiceCodec {
    type Item = Request;
    type Error = ProtoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < REQUEST_LEN {
            src.reserve(REQUEST_LEN - src.len());
            return Ok(None);
        }
        let input = src.get_i32();
        let symbol = src.get_u16();
        Ok(Some(Request { input, symbol }))
    }
}

impl Encoder<Response> for ServiceCodec {
    type Error = ProtoError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(RESPONSE_LEN);
        match item {
            Response::Value(value) => {
                dst.put_u8(TAG_VALUE);
                dst.put_f64(value);
            }
            Response::Rejected(Rejection::UnknownSymbol(unit)) => {
                dst.put_u8(TAG_UNKNOWN_SYMBOL);
                dst.put_u64(u64::from(unit));
            }
        }
        Ok(())
    }
}

impl Encoder<Request> for ClientCodec {
    type Error = ProtoError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(REQUEST_LEN);
        dst.put_i32(item.input);
        dst.put_u16(item.symbol);
        Ok(())
    }
}

impl Decoder for ClientCodec {
    type Item = Response;
    type Error = ProtoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < RESPONSE_LEN {
            src.reserve(RESPONSE_LEN - src.len());
            return Ok(None);
        }
        let tag = src.get_u8();
        let payload = src.get_u64();
        match tag {
            TAG_VALUE => Ok(Some(Response::Value(f64::from_bits(payload)))),
            // Only the low 16 bits are meaningful for a code unit.
            TAG_UNKNOWN_SYMBOL => Ok(Some(Response::Rejected(Rejection::UnknownSymbol(
                (payload & 0xFFFF) as u16,
            )))),
            other => Err(ProtoError::UnknownTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout_is_int_then_char() {
        let mut buf = BytesMut::new();
        ClientCodec
            .encode(Request::new(5, Symbol::Factorial), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 5, 0, b'F']);
    }

    #[test]
    fn partial_request_waits_for_more_bytes() {
        let mut buf = BytesMut::from(&[0u8, 0, 0][..]);
        assert!(ServiceCodec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[10, 0, b'B']);
        let req = ServiceCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(req.input, 10);
        assert_eq!(req.symbol(), Ok(Symbol::Fibonacci));
        assert!(buf.is_empty());
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let req = Request::raw(3, u16::from(b'X'));
        assert_eq!(req.symbol(), Err(Rejection::UnknownSymbol(u16::from(b'X'))));
        assert_eq!(
            Rejection::UnknownSymbol(u16::from(b'X')).to_string(),
            "unknown symbol 'X'"
        );
    }

    #[test]
    fn value_response_keeps_exact_bits() {
        let mut buf = BytesMut::new();
        ServiceCodec
            .encode(Response::Value(2f64.sqrt()), &mut buf)
            .unwrap();
        assert_eq!(buf.len(), RESPONSE_LEN);
        assert_eq!(buf[0], TAG_VALUE);

        let resp = ClientCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(resp, Response::Value(2f64.sqrt()));
    }

    #[test]
    fn rejection_response_carries_the_code_unit() {
        let mut buf = BytesMut::new();
        ServiceCodec
            .encode(
                Response::Rejected(Rejection::UnknownSymbol(u16::from(b'Q'))),
                &mut buf,
            )
            .unwrap();
        let resp = ClientCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            resp,
            Response::Rejected(Rejection::UnknownSymbol(u16::from(b'Q')))
        );
    }

    #[test]
    fn unknown_tag_is_a_protocol_error() {
        let mut buf = BytesMut::from(&[7u8, 0, 0, 0, 0, 0, 0, 0, 0][..]);
        assert!(matches!(
            ClientCodec.decode(&mut buf),
            Err(ProtoError::UnknownTag(7))
        ));
    }
}
