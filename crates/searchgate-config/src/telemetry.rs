//! Settings for the daemon's `tracing` output.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Filter applied when neither `--log-filter` nor `SEARCHGATE_LOG_FILTER`
/// is given.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// How log records are rendered on stderr.
///
/// Accepted spellings are case-insensitive on the command line and in the
/// environment; configuration files use the lowercase form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with the fields flattened.
    #[default]
    Json,
    /// Single-line text for terminals.
    Compact,
}
