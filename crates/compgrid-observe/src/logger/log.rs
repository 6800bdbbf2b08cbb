use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

/// Human-readable lines on stderr.
pub(crate) fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets)
        .with_timer(timer());

    install(tracing_subscriber::registry().with(filter(&cfg.level)?).with(layer))
}

/// One JSON object per event on stderr.
pub(crate) fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_current_span(true)
        .with_timer(timer());

    install(tracing_subscriber::registry().with(filter(&cfg.level)?).with(layer))
}

#[cfg(all(target_os = "linux", feature = "journald"))]
pub(crate) fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("compgridd".to_string());

    install(tracing_subscriber::registry().with(filter(&cfg.level)?).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
pub(crate) fn journald(_cfg: &LoggerConfig) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

pub(crate) fn filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|e| LoggerError::InvalidLogLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

fn timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e: TryInitError| {
        let msg = e.to_string();
        if msg.contains("already") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(msg)
        }
    })
}
