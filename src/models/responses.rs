//! Response DTOs for the command-line tool
//!
//! Defines the JSON documents printed on stdout for each command.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CachedValue, WriteOutcome};
use crate::error::Result;

/// Output of `get`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// Whether a fresh value was found
    pub hit: bool,
    /// The stored value, `null` on a miss
    pub value: Value,
    /// When the value was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_at: Option<DateTime<Utc>>,
    /// Milliseconds until the value goes stale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_remaining_ms: Option<u64>,
}

impl GetResponse {
    /// Creates a GetResponse from an optional cache entry
    pub fn new(key: impl Into<String>, entry: Option<CachedValue>) -> Self {
        let key = key.into();
        match entry {
            Some(entry) => Self {
                key,
                hit: true,
                written_at: entry.stamp.written_at_utc(),
                ttl_remaining_ms: Some(entry.ttl_remaining_ms),
                value: entry.value,
            },
            None => Self {
                key,
                hit: false,
                value: Value::Null,
                written_at: None,
                ttl_remaining_ms: None,
            },
        }
    }
}

/// Result of a mutating command as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Written,
    Unchanged,
    SkippedReadOnly,
    Failed,
}

impl From<WriteOutcome> for WriteStatus {
    fn from(outcome: WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Written => WriteStatus::Written,
            WriteOutcome::Unchanged => WriteStatus::Unchanged,
            WriteOutcome::SkippedReadOnly => WriteStatus::SkippedReadOnly,
        }
    }
}

/// Output of `set`, `del` and `clear`
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Operation name
    pub operation: String,
    /// The key involved, absent for `clear`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// What happened to the cache file
    pub outcome: WriteStatus,
    /// Failure description when `outcome` is `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteResponse {
    /// Creates a WriteResponse from the result of a `try_*` cache call
    pub fn new(operation: &str, key: Option<&str>, result: Result<WriteOutcome>) -> Self {
        let (outcome, error) = match result {
            Ok(outcome) => (outcome.into(), None),
            Err(e) => (WriteStatus::Failed, Some(e.to_string())),
        };
        Self {
            operation: operation.to_string(),
            key: key.map(str::to_string),
            outcome,
            error,
        }
    }
}

/// Output of `keys`
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// Fresh keys in sorted order
    pub keys: Vec<String>,
    /// Number of fresh keys
    pub count: usize,
}

impl KeysResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Output of `purge`
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    /// Number of expired entries removed
    pub removed: usize,
}
