//! Shared configuration for the NAPI message dispatcher.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a
//! configuration file, then `NAPI_*` environment variables, then command-line
//! flags. Only the ambient concerns of the listener live here (logging and
//! the message source poll interval); subscriber bindings are code, not
//! configuration.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, default_log_filter, default_log_filter_string,
    default_log_format, default_poll_interval, default_poll_interval_ms,
};
pub use logging::LogFormat;

/// Resolved listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NAPI")]
pub struct Config {
    /// `tracing` filter expression, for example `info` or `napi_dispatch=debug`.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log lines.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Bounded wait applied to each message source poll, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Filter expression handed to the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Selected log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Poll interval for the message loop.
    ///
    /// A zero interval is clamped to one millisecond so an idle loop never
    /// spins.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
