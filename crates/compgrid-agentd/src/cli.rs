//! Command-line flags and environment.
use std::{net::IpAddr, time::Duration};

use clap::{Args, Parser, Subcommand};

use compgrid_core::RetryPolicy;
use compgrid_model::{Argument, Symbol};
use compgrid_observe::{LoggerConfig, LoggerError, LoggerFormat};
use compgrid_service::{DEFAULT_BASE_PORT, DEFAULT_ENDPOINTS, PacingTable, ServiceConfig};

/// compgridd: orchestrate groups of calculation components against a local calculation service.
#[derive(Parser, Debug)]
#[command(name = "compgridd", version, about)]
pub struct Cli {
    /// Address the service endpoints bind to.
    #[arg(long, default_value = "127.0.0.1", env = "COMPGRID_HOST")]
    pub host: IpAddr,

    /// Port of slot 0; slot i listens on base + i.
    #[arg(long, default_value_t = DEFAULT_BASE_PORT, env = "COMPGRID_BASE_PORT")]
    pub base_port: u16,

    /// Number of service endpoints, i.e. the most components a group can hold.
    #[arg(long, default_value_t = DEFAULT_ENDPOINTS)]
    pub endpoints: usize,

    /// Multiplier for the simulated computation time (0 disables it).
    #[arg(long, default_value_t = 1.0)]
    pub pace_scale: f64,

    /// Connect attempts per component before it is skipped.
    #[arg(long, default_value_t = 3)]
    pub connect_attempts: u32,

    /// Pause between connect attempts, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub connect_delay_ms: u64,

    /// Log filter directive.
    #[arg(long, default_value = "info", env = "COMPGRID_LOG")]
    pub log_level: String,

    /// Log format: text, json or journald.
    #[arg(long, default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Mode {
    /// Start the service and read commands from stdin (default).
    Shell,
    /// Run only the calculation service until interrupted.
    Serve,
    /// Run one workload on every execution backend and compare.
    Compare(CompareArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CompareArgs {
    /// Calculation kind: F, B, P or S.
    #[arg(long, default_value = "F", value_parser = parse_symbol)]
    pub symbol: Symbol,

    /// Input of the calculation.
    #[arg(long, default_value_t = 5)]
    pub input: Argument,

    /// Number of backends, handed out in rotation.
    #[arg(long, default_value_t = 3)]
    pub count: usize,
}

fn parse_symbol(s: &str) -> Result<Symbol, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Symbol::try_from(c).map_err(|e| e.to_string()),
        _ => Err(format!("expected one of F, B, P, S; got '{s}'")),
    }
}

impl Cli {
    pub fn mode(&self) -> Mode {
        self.mode.clone().unwrap_or(Mode::Shell)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            host: self.host,
            base_port: self.base_port,
            endpoints: self.endpoints,
            pacing: PacingTable::realistic().scaled(self.pace_scale),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.connect_attempts,
            Duration::from_millis(self.connect_delay_ms),
        )
    }

    pub fn logger_config(&self) -> Result<LoggerConfig, LoggerError> {
        let format: LoggerFormat = self.log_format.parse()?;
        Ok(LoggerConfig::default()
            .with_format(format)
            .with_level(self.log_level.clone()))
    }
}
