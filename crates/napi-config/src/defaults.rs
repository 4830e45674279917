use std::time::Duration;

use crate::logging::LogFormat;

/// Default log filter expression used by the listener.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default bounded wait applied to each message source poll, in milliseconds.
///
/// The stop flag is re-checked after every poll, so this also bounds how long
/// a stop request can go unnoticed on an idle stream.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default log filter expression used by the listener.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default poll interval in milliseconds (serde default hook).
#[must_use]
pub const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Default poll interval as a [`Duration`].
#[must_use]
pub const fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
}
