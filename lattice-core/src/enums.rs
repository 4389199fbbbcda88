//! Enumerated wire values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a batched-commands record as reported by the node CLI.
///
/// Unknown wire values parse into `Other` rather than failing, so a node
/// upgrade that introduces a new status cannot break enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BatchStatus {
    #[default]
    #[serde(rename = "BATCHED_COMMANDS_STATUS_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "BATCHED_COMMANDS_STATUS_SIGNING")]
    Signing,
    #[serde(rename = "BATCHED_COMMANDS_STATUS_SIGNED")]
    Signed,
    #[serde(rename = "BATCHED_COMMANDS_STATUS_ABORTED")]
    Aborted,
    #[serde(untagged)]
    Other(String),
}

impl BatchStatus {
    /// The terminal status that triggers signed-batch reconciliation.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed)
    }

    /// Wire representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => "BATCHED_COMMANDS_STATUS_UNSPECIFIED",
            Self::Signing => "BATCHED_COMMANDS_STATUS_SIGNING",
            Self::Signed => "BATCHED_COMMANDS_STATUS_SIGNED",
            Self::Aborted => "BATCHED_COMMANDS_STATUS_ABORTED",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for BatchStatus {
    fn from(s: &str) -> Self {
        match s {
            "BATCHED_COMMANDS_STATUS_UNSPECIFIED" => Self::Unspecified,
            "BATCHED_COMMANDS_STATUS_SIGNING" => Self::Signing,
            "BATCHED_COMMANDS_STATUS_SIGNED" => Self::Signed,
            "BATCHED_COMMANDS_STATUS_ABORTED" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }
}
