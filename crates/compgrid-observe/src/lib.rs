//! Logging setup and a notification sink that writes to the log.
mod logger;
pub use logger::*;

#[cfg(feature = "sink")]
mod sink;
#[cfg(feature = "sink")]
pub use sink::*;
