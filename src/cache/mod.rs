//! Cache Module
//!
//! Provides a persistent key-value cache stored as one flat JSON object on disk,
//! with a single global TTL.

mod document;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use document::{CacheDocument, Lookup};
pub use entry::{current_timestamp_ms, ExpiryStamp};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{CachedValue, FileCache, WriteOutcome};

// == Public Constants ==
/// Suffix of the sibling field holding a key's write timestamp
pub const EXPIRE_SUFFIX: &str = "_expire_time";

/// Default TTL in milliseconds (10^12 ms, roughly 31.7 years)
pub const DEFAULT_TTL_MS: u64 = 1_000_000_000 * 1000;

/// Default cache file name, resolved against the working directory
pub const DEFAULT_CACHE_FILE: &str = "data.json";

/// Name of the expiry marker field for `key`.
pub fn expire_key(key: &str) -> String {
    format!("{}{}", key, EXPIRE_SUFFIX)
}

/// True when `key` would be mistaken for an expiry marker.
pub fn is_reserved_key(key: &str) -> bool {
    key.ends_with(EXPIRE_SUFFIX)
}
