use std::net::{IpAddr, SocketAddr};

use compgrid_model::Slot;

use crate::error::{ServiceError, ServiceResult};

/// Slot → address map of the service.
///
/// Fixed at process start. Slot `i` always resolves to the `i`-th address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    addrs: Vec<SocketAddr>,
}

impl Endpoints {
    /// Contiguous block: slot `i` maps to `host:(base_port + i)`.
    pub fn contiguous(host: IpAddr, base_port: u16, count: usize) -> ServiceResult<Self> {
        if count == 0 {
            return Err(ServiceError::NoEndpoints);
        }
        let last = u16::try_from(count - 1)
            .ok()
            .and_then(|offset| base_port.checked_add(offset))
            .ok_or(ServiceError::PortRange {
                base: base_port,
                count,
            })?;

        let addrs = (base_port..=last)
            .map(|port| SocketAddr::new(host, port))
            .collect();
        Ok(Self { addrs })
    }

    /// Explicit list, e.g. the resolved addresses of listeners bound to port `0`.
    pub fn from_addrs(addrs: Vec<SocketAddr>) -> Self {
        Self { addrs }
    }

    pub fn get(&self, slot: Slot) -> Option<SocketAddr> {
        self.addrs.get(slot).copied()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, SocketAddr)> + '_ {
        self.addrs.iter().copied().enumerate()
    }
}
