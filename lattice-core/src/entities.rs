//! Core entity structures
//!
//! Wire and persisted record shapes. Fields the core does not interpret
//! are carried through opaquely in `extra` maps so round-tripping a
//! record never loses data.

use crate::{BatchStatus, TimeBucket};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw response from the external command-execution service.
///
/// Transport failures are embedded in `error` rather than surfaced as a
/// fatal failure, so callers always receive a response body to inspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CliResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CliResponse {
    /// Build a response that embeds a service failure.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(Value::String(message.into())),
            ..Self::default()
        }
    }
}

/// Cached command result, keyed by the exact command string.
///
/// Never explicitly deleted; staleness is implicit via the TTL check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub response: CliResponse,
    /// Unix seconds at write time.
    pub updated_at: i64,
}

impl CacheEntry {
    /// Whether this entry is still usable at `now_secs` under the given
    /// TTL: `now - updated_at <= ttl_minutes`.
    pub fn is_fresh(&self, now_secs: i64, ttl_minutes: i64) -> bool {
        now_secs - self.updated_at <= ttl_minutes * 60
    }
}

/// Result returned to the caller of the cache-aside query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub response: CliResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    pub cache_hit: bool,
}

/// Parsed stdout of a batched-commands query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQueryOutput {
    pub id: String,
    #[serde(default)]
    pub command_ids: Vec<String>,
    #[serde(default)]
    pub status: BatchStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Protocol parameters of a single command; only `salt` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommandParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single cross-chain command within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub command_type: Option<String>,
    /// Best effort; once true it is never downgraded by a merge.
    #[serde(default)]
    pub executed: bool,
    /// Once resolved, preserved across merges even if a later resolution
    /// attempt fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_address: Option<String>,
    #[serde(default)]
    pub params: CommandParams,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Persisted batch record, keyed by `batch_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Id as reported by the node.
    pub id: String,
    /// Canonical key; equals `id`.
    pub batch_id: String,
    pub chain: String,
    #[serde(default)]
    pub command_ids: Vec<String>,
    #[serde(default)]
    pub status: BatchStatus,
    pub created_at: TimeBucket,
    /// Union of the previously persisted set and the freshly resolved
    /// set, deduplicated by command id, existing order preserved.
    #[serde(default)]
    pub commands: Vec<CommandRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stamp recording which signed batch/command finalized a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignBatchStamp {
    pub chain: String,
    pub batch_id: String,
    pub command_id: String,
    pub transfer_id: u64,
    /// Monotonic: never downgraded once true.
    pub executed: bool,
    pub created_at: TimeBucket,
}

/// Origin leg of a transfer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransferSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A confirmation or vote leg carrying its own transfer id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransferLeg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Persisted transfer record, keyed by `{source.id}_{recipient_address}`
/// lower-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransferRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TransferSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_deposit: Option<TransferLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<TransferLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_batch: Option<SignBatchStamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransferRecord {
    /// Store key for this record, if the source id is resolvable.
    pub fn store_key(&self) -> Option<String> {
        let source = self.source.as_ref()?;
        let id = source.id.as_deref()?;
        let recipient = source.recipient_address.as_deref().unwrap_or_default();
        Some(format!("{}_{}", id, recipient).to_lowercase())
    }
}
