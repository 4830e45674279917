//! Log output format selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the lines written by the listener's tracing subscriber.
///
/// Parsed case-insensitively from `json` or `compact`, whether it comes from
/// a flag, `NAPI_LOG_FORMAT` or a configuration file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Terse human-readable lines.
    Compact,
}
