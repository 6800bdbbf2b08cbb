use std::net::{IpAddr, Ipv4Addr};

use crate::{Endpoints, PacingTable, error::ServiceResult};

pub const DEFAULT_BASE_PORT: u16 = 8000;
pub const DEFAULT_ENDPOINTS: usize = 10;

/// Calculation service settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address every endpoint binds to.
    pub host: IpAddr,
    /// Port of slot `0`.
    pub base_port: u16,
    /// Number of endpoints, i.e. the largest component count a group can run.
    pub endpoints: usize,
    /// Simulated cost of each calculation kind.
    pub pacing: PacingTable,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            base_port: DEFAULT_BASE_PORT,
            endpoints: DEFAULT_ENDPOINTS,
            pacing: PacingTable::realistic(),
        }
    }
}

impl ServiceConfig {
    pub fn endpoints(&self) -> ServiceResult<Endpoints> {
        Endpoints::contiguous(self.host, self.base_port, self.endpoints)
    }
}
