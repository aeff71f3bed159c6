//! # Beacon Log
//!
//! Logger setup for beacon processes.
//!
//! Diagnostics always go to stderr so they never interleave with the
//! operator event stream on stdout.
//!
//! ```no_run
//! let _guard = beacon_log::init_with(beacon_log::Config::from_env())?;
//! tracing::info!(port = 9092, "broker listening");
//! # Ok::<(), beacon_log::LogError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Fields, Format};
pub use error::LogError;

/// Install `config`.
pub fn init_with(config: Config) -> Result<LoggerGuard, LogError> {
    LoggerBuilder::from_config(config).build()
}

/// Install [`Config::test`] once per process; later calls are no-ops.
pub fn init_test() -> LoggerGuard {
    if tracing::dispatcher::has_been_set() {
        return LoggerGuard::noop();
    }
    init_with(Config::test()).unwrap_or_else(|_| LoggerGuard::noop())
}
