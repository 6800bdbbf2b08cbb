use thiserror::Error;

/// Why the global subscriber could not be installed.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid logger format: {0} (expected: text|json|journald)")]
    InvalidFormat(String),
    #[error("Invalid log level '{level}': {reason}")]
    InvalidLogLevel { level: String, reason: String },
    #[error("Journald is not supported on this platform or feature disabled")]
    JournaldNotSupported,
    #[error("Logger has been already initialized")]
    AlreadyInitialized,
    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),
}
