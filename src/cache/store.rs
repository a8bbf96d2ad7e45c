//! Cache Store Module
//!
//! `FileCache` runs every operation as a whole-file read, parse, mutate and
//! write cycle on one JSON document. There is no locking: concurrent writers
//! race and the last completed write wins.
//!
//! Each operation comes in two forms. The `try_*` form returns a
//! [`Result`] carrying the failure. The plain form is the error boundary: it
//! logs the failure and returns a miss or nothing, so callers never observe
//! an error.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::{
    current_timestamp_ms, is_reserved_key, CacheDocument, CacheStats, ExpiryStamp, Lookup,
    StatsSnapshot, DEFAULT_TTL_MS,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Write Outcome ==
/// What a mutating operation did to the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The document was rewritten
    Written,
    /// Nothing to change, the file was left alone
    Unchanged,
    /// The read-only guard suppressed the write
    SkippedReadOnly,
}

// == Cached Value ==
/// A fresh value together with its write metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    /// The stored value
    pub value: Value,
    /// When the value was written
    pub stamp: ExpiryStamp,
    /// Milliseconds until the value goes stale
    pub ttl_remaining_ms: u64,
}

// == File Cache ==
/// Persistent key-value cache backed by a single JSON file.
#[derive(Debug)]
pub struct FileCache {
    /// Location of the cache file
    path: PathBuf,
    /// Global TTL in milliseconds
    ttl_ms: u64,
    /// Skip all writes when set
    read_only: bool,
    /// Per-process counters
    stats: CacheStats,
}

impl FileCache {
    // == Constructors ==
    /// Creates a cache stored at `path` with the default TTL.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl_ms: DEFAULT_TTL_MS,
            read_only: false,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_path.clone())
            .with_ttl(config.ttl_ms)
            .with_read_only(config.read_only)
    }

    /// Overrides the TTL in milliseconds.
    pub fn with_ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Enables or disables the read-only guard.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    // == Accessors ==
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Get ==
    /// Looks up `key` and returns its value with write metadata.
    ///
    /// A missing file, an absent or unparseable marker, or an expired entry
    /// is `Ok(None)`. Unreadable or corrupt files are errors.
    pub fn try_get_entry(&self, key: &str) -> Result<Option<CachedValue>> {
        let doc = match CacheDocument::load(&self.path) {
            Ok(doc) => doc,
            Err(e) => {
                self.stats.record_miss();
                return Err(e);
            }
        };

        let now = current_timestamp_ms();
        match doc.lookup(key, self.ttl_ms, now) {
            Lookup::Hit { value, stamp } => {
                self.stats.record_hit();
                Ok(Some(CachedValue {
                    value,
                    stamp,
                    ttl_remaining_ms: stamp.ttl_remaining_ms_at(self.ttl_ms, now),
                }))
            }
            Lookup::Expired(stamp) => {
                debug!(key, written_at = stamp.written_at, "Cache entry expired");
                self.stats.record_miss();
                Ok(None)
            }
            Lookup::Missing => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    /// Looks up the value stored under `key`.
    pub fn try_get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.try_get_entry(key)?.map(|entry| entry.value))
    }

    /// Returns the fresh entry for `key`, or `None` on any miss or failure.
    pub fn get_entry(&self, key: &str) -> Option<CachedValue> {
        match self.try_get_entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read JSON cache file");
                None
            }
        }
    }

    /// Returns the fresh value for `key`, or `None` on any miss or failure.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Returns the value for `key` deserialized into `T`.
    ///
    /// A stored value of the wrong shape is logged and treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    // == Keys ==
    /// Sorted list of keys that are currently fresh.
    pub fn try_keys(&self) -> Result<Vec<String>> {
        let doc = CacheDocument::load(&self.path)?;
        Ok(doc.fresh_keys(self.ttl_ms, current_timestamp_ms()))
    }

    /// Sorted list of fresh keys, empty when the file cannot be read.
    pub fn keys(&self) -> Vec<String> {
        self.try_keys().unwrap_or_else(|e| {
            error!(path = %self.path.display(), error = %e, "Failed to read JSON cache file");
            Vec::new()
        })
    }

    // == Set ==
    /// Stores `value` under `key` stamped with the current time.
    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<WriteOutcome> {
        if self.read_only {
            return Ok(self.skip_write("set"));
        }
        let result = self.write_entry(key, value);
        self.track_write(result)
    }

    /// Stores `value` under `key`; failures are logged and swallowed.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set(key, value) {
            warn!(key, error = %e, "Unable to write cache file");
        }
    }

    // == Delete ==
    /// Removes `key` and its expiry marker.
    ///
    /// The file is only rewritten when one of the two fields existed.
    pub fn try_delete(&self, key: &str) -> Result<WriteOutcome> {
        if self.read_only {
            return Ok(self.skip_write("delete"));
        }
        let result = self.remove_entry(key);
        self.track_write(result)
    }

    /// Removes `key`; failures are logged and swallowed.
    pub fn delete(&self, key: &str) {
        if let Err(e) = self.try_delete(key) {
            warn!(key, error = %e, "Unable to delete cache entry");
        }
    }

    // == Clear ==
    /// Replaces the whole document with an empty object.
    pub fn try_clear(&self) -> Result<WriteOutcome> {
        if self.read_only {
            return Ok(self.skip_write("clear"));
        }
        let result = CacheDocument::new()
            .save(&self.path)
            .map(|()| WriteOutcome::Written);
        self.track_write(result)
    }

    /// Empties the cache; failures are logged and swallowed.
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!(error = %e, "Unable to clean cache");
        }
    }

    // == Purge Expired ==
    /// Removes every stale entry from the file.
    ///
    /// Returns the number of entries removed; the file is only rewritten when
    /// that number is non-zero.
    pub fn try_purge_expired(&self) -> Result<usize> {
        if self.read_only {
            self.skip_write("purge");
            return Ok(0);
        }
        let result = self.load_for_write().and_then(|mut doc| {
            let removed = doc.purge_expired(self.ttl_ms, current_timestamp_ms());
            if removed == 0 {
                return Ok(0);
            }
            doc.save(&self.path)?;
            Ok(removed)
        });

        match result {
            Ok(0) => {
                debug!("Purge: no expired entries found");
                Ok(0)
            }
            Ok(removed) => {
                self.stats.record_write();
                info!("Purge: removed {} expired entries", removed);
                Ok(removed)
            }
            Err(e) => {
                self.stats.record_failed_write();
                Err(e)
            }
        }
    }

    /// Removes stale entries; failures are logged and count as zero removed.
    pub fn purge_expired(&self) -> usize {
        self.try_purge_expired().unwrap_or_else(|e| {
            warn!(error = %e, "Unable to purge expired cache entries");
            0
        })
    }

    // == Internals ==
    fn write_entry<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<WriteOutcome> {
        if is_reserved_key(key) {
            return Err(CacheError::ReservedKey(key.to_string()));
        }
        let value = serde_json::to_value(value)?;
        let mut doc = self.load_for_write()?;
        doc.insert(key, value, ExpiryStamp::now());
        doc.save(&self.path)?;
        Ok(WriteOutcome::Written)
    }

    fn remove_entry(&self, key: &str) -> Result<WriteOutcome> {
        let mut doc = self.load_for_write()?;
        if !doc.remove(key) {
            return Ok(WriteOutcome::Unchanged);
        }
        doc.save(&self.path)?;
        Ok(WriteOutcome::Written)
    }

    /// Loads the document before a mutation.
    ///
    /// Unlike reads, a corrupt file is not an error here: it is replaced by an
    /// empty document so the write can proceed.
    fn load_for_write(&self) -> Result<CacheDocument> {
        match CacheDocument::load(&self.path) {
            Err(e) if e.is_corrupt() => {
                warn!(path = %self.path.display(), error = %e, "Replacing unreadable cache file");
                Ok(CacheDocument::new())
            }
            other => other,
        }
    }

    fn skip_write(&self, operation: &str) -> WriteOutcome {
        self.stats.record_skipped_write();
        info!(
            operation,
            path = %self.path.display(),
            "[Cache] Skipping file cache in read-only deployment"
        );
        WriteOutcome::SkippedReadOnly
    }

    fn track_write(&self, result: Result<WriteOutcome>) -> Result<WriteOutcome> {
        match &result {
            Ok(WriteOutcome::Written) => self.stats.record_write(),
            Ok(_) => {}
            Err(_) => self.stats.record_failed_write(),
        }
        result
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_cache() -> (FileCache, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let cache = FileCache::new(dir.path().join("data.json"));
        (cache, dir)
    }

    #[test]
    fn test_get_missing_file() {
        let (cache, _dir) = create_test_cache();

        assert_eq!(cache.get("anything"), None);
        assert!(!cache.path().exists());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _dir) = create_test_cache();

        cache.set("key1", "value1");

        assert_eq!(cache.get("key1"), Some(json!("value1")));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn test_set_overwrite() {
        let (cache, _dir) = create_test_cache();

        cache.set("key1", &json!({"v": 1}));
        cache.set("key1", &json!({"v": 2}));

        assert_eq!(cache.get("key1"), Some(json!({"v": 2})));
    }

    #[test]
    fn test_set_keeps_other_keys() {
        let (cache, _dir) = create_test_cache();

        cache.set("a", &1);
        cache.set("b", &2);

        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("b"), Some(json!(2)));
        assert_eq!(cache.keys(), vec!["a", "b"]);
    }

    #[test]
    fn test_get_entry_metadata() {
        let (cache, _dir) = create_test_cache();
        let cache = cache.with_ttl(60_000);

        let before = current_timestamp_ms();
        cache.set("k", &true);
        let after = current_timestamp_ms();

        let entry = cache.get_entry("k").unwrap();
        assert_eq!(entry.value, json!(true));
        assert!(entry.stamp.written_at >= before && entry.stamp.written_at <= after);
        assert!(entry.ttl_remaining_ms <= 60_000);
    }

    #[test]
    fn test_get_as_typed() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Profile {
            name: String,
            age: u32,
        }

        let (cache, _dir) = create_test_cache();
        let profile = Profile {
            name: "ada".to_string(),
            age: 36,
        };
        cache.set("profile", &profile);

        assert_eq!(cache.get_as::<Profile>("profile"), Some(profile));
        assert_eq!(cache.get_as::<Vec<u8>>("profile"), None);
    }

    #[test]
    fn test_zero_ttl_expires() {
        let (cache, dir) = create_test_cache();
        let cache = cache.with_ttl(0);
        fs::write(
            dir.path().join("data.json"),
            json!({"k": 1, "k_expire_time": current_timestamp_ms() - 10}).to_string(),
        )
        .unwrap();

        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let (cache, _dir) = create_test_cache();
        fs::write(cache.path(), "{{{ definitely not json").unwrap();

        assert_eq!(cache.get("k"), None);
        assert!(matches!(
            cache.try_get("k"),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_set_replaces_corrupt_file() {
        let (cache, _dir) = create_test_cache();
        fs::write(cache.path(), "[not an object]").unwrap();

        assert_eq!(cache.try_set("k", "v").unwrap(), WriteOutcome::Written);
        assert_eq!(cache.get("k"), Some(json!("v")));
        assert_eq!(cache.keys(), vec!["k"]);
    }

    #[test]
    fn test_delete_removes_value_and_marker() {
        let (cache, _dir) = create_test_cache();
        cache.set("gone", &1);
        cache.set("kept", &2);

        assert_eq!(cache.try_delete("gone").unwrap(), WriteOutcome::Written);

        assert_eq!(cache.get("gone"), None);
        assert_eq!(cache.get("kept"), Some(json!(2)));
        let raw: Value = serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert!(raw.get("gone").is_none());
        assert!(raw.get("gone_expire_time").is_none());
    }

    #[test]
    fn test_delete_absent_key_is_unchanged() {
        let (cache, _dir) = create_test_cache();

        assert_eq!(cache.try_delete("nothing").unwrap(), WriteOutcome::Unchanged);
        assert!(!cache.path().exists());
        assert_eq!(cache.stats().writes, 0);
    }

    #[test]
    fn test_clear() {
        let (cache, _dir) = create_test_cache();
        cache.set("a", &1);
        cache.set("b", &2);

        cache.clear();

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(fs::read_to_string(cache.path()).unwrap(), "{}");
    }

    #[test]
    fn test_reserved_key_refused() {
        let (cache, _dir) = create_test_cache();

        let result = cache.try_set("token_expire_time", &1);
        assert!(matches!(result, Err(CacheError::ReservedKey(_))));

        cache.set("token_expire_time", &1);
        assert!(!cache.path().exists());
        assert_eq!(cache.stats().failed_writes, 2);
    }

    #[test]
    fn test_read_only_skips_every_write() {
        let (cache, _dir) = create_test_cache();
        cache.set("k", "before");
        let original = fs::read(cache.path()).unwrap();

        let cache = cache.with_read_only(true);
        assert_eq!(cache.try_set("k", "after").unwrap(), WriteOutcome::SkippedReadOnly);
        assert_eq!(cache.try_delete("k").unwrap(), WriteOutcome::SkippedReadOnly);
        assert_eq!(cache.try_clear().unwrap(), WriteOutcome::SkippedReadOnly);
        assert_eq!(cache.try_purge_expired().unwrap(), 0);

        assert_eq!(fs::read(cache.path()).unwrap(), original);
        assert_eq!(cache.get("k"), Some(json!("before")));
        assert_eq!(cache.stats().skipped_writes, 4);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A directory where the cache file should be makes the rename fail
        let path = dir.path().join("data.json");
        fs::create_dir(&path).unwrap();
        let cache = FileCache::new(&path);

        cache.set("k", &1);
        cache.delete("k");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.writes, 0);
        assert!(stats.failed_writes >= 2);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_purge_expired() {
        let (cache, dir) = create_test_cache();
        let cache = cache.with_ttl(1_000);
        let now = current_timestamp_ms();
        fs::write(
            dir.path().join("data.json"),
            json!({
                "stale": 1, "stale_expire_time": now - 5_000,
                "fresh": 2, "fresh_expire_time": now
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(cache.keys(), vec!["fresh"]);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            cache_path: PathBuf::from("/tmp/somewhere/cache.json"),
            ttl_ms: 5,
            read_only: true,
        };
        let cache = FileCache::from_config(&config);

        assert_eq!(cache.path(), Path::new("/tmp/somewhere/cache.json"));
        assert_eq!(cache.ttl_ms(), 5);
        assert!(cache.is_read_only());
    }
}
