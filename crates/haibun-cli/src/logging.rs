//! Structured logging with environment variable configuration.
//!
//! Logs go to stderr so that stdout carries only the run report. Records
//! emitted through the `log` facade by the engine are forwarded to the
//! same subscriber.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_filter_str())
}

/// Initialise the logging subsystem.
///
/// Level precedence (highest to lowest):
///
/// 1. CLI `--log-level`
/// 2. `HAIBUN_LOG_LEVEL`
/// 3. `info`
///
/// If a global subscriber or `log` logger is already installed the call is
/// a no-op; the first one wins.
pub fn init_logging(level: LogLevel) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
}
