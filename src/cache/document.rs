//! Cache Document Module
//!
//! In-memory form of the cache file: one flat JSON object holding every value
//! next to its `<key>_expire_time` marker.

use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::cache::{expire_key, ExpiryStamp, EXPIRE_SUFFIX};
use crate::error::{CacheError, Result};

// == Lookup ==
/// Outcome of looking a key up in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Value present and its marker still within the TTL
    Hit { value: Value, stamp: ExpiryStamp },
    /// Marker present but past its deadline
    Expired(ExpiryStamp),
    /// No value, or no usable marker
    Missing,
}

// == Cache Document ==
/// Flat JSON object backing the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheDocument {
    fields: Map<String, Value>,
}

impl CacheDocument {
    // == Constructor ==
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // == Load ==
    /// Reads and parses the document at `path`.
    ///
    /// A missing or blank file is an empty document. Content that is not a
    /// JSON object is reported as corrupt.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Parses file content; `path` is only used for error reporting.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(content).map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(CacheError::NotAnObject {
                path: path.to_path_buf(),
            }),
        }
    }

    // == Lookup ==
    /// Looks up `key`, applying the TTL at time `now`.
    pub fn lookup(&self, key: &str, ttl_ms: u64, now: i64) -> Lookup {
        let stamp = match self
            .fields
            .get(&expire_key(key))
            .and_then(ExpiryStamp::from_marker)
        {
            Some(stamp) => stamp,
            None => return Lookup::Missing,
        };

        if stamp.is_expired_at(ttl_ms, now) {
            return Lookup::Expired(stamp);
        }

        match self.fields.get(key) {
            Some(value) => Lookup::Hit {
                value: value.clone(),
                stamp,
            },
            None => Lookup::Missing,
        }
    }

    // == Mutation ==
    /// Stores `value` under `key` with the given write stamp.
    pub fn insert(&mut self, key: &str, value: Value, stamp: ExpiryStamp) {
        self.fields.insert(key.to_string(), value);
        self.fields.insert(expire_key(key), stamp.to_marker());
    }

    /// Removes `key` and its marker. Returns true if either field existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let value = self.fields.remove(key).is_some();
        let marker = self.fields.remove(&expire_key(key)).is_some();
        value || marker
    }

    /// Removes every entry that is not a fresh hit at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, ttl_ms: u64, now: i64) -> usize {
        let stale: Vec<String> = self
            .entry_names()
            .into_iter()
            .filter(|name| !matches!(self.lookup(name, ttl_ms, now), Lookup::Hit { .. }))
            .collect();

        for name in &stale {
            self.remove(name);
        }
        stale.len()
    }

    // == Inspection ==
    /// Sorted keys that are fresh at `now`.
    pub fn fresh_keys(&self, ttl_ms: u64, now: i64) -> Vec<String> {
        self.entry_names()
            .into_iter()
            .filter(|name| matches!(self.lookup(name, ttl_ms, now), Lookup::Hit { .. }))
            .collect()
    }

    /// Distinct entry names, whether they appear as a value, a marker or both.
    fn entry_names(&self) -> BTreeSet<String> {
        self.fields
            .keys()
            .map(|field| {
                field
                    .strip_suffix(EXPIRE_SUFFIX)
                    .unwrap_or(field)
                    .to_string()
            })
            .collect()
    }

    /// Number of raw fields, markers included.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document holds no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // == Save ==
    /// Serializes the whole document compactly.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// Writes the whole document to `path`.
    ///
    /// The content goes to a temporary file in the same directory which then
    /// replaces the cache file, so readers never see a partial document. An
    /// existing file keeps its permissions, and a symlinked path has its
    /// target replaced rather than the link itself.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_string()?;

        let target = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
            Err(e) => return Err(CacheError::io(path, e)),
        };
        let existing = match fs::metadata(&target) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(CacheError::io(&target, e)),
        };

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        if let Some(permissions) = existing {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| CacheError::io(tmp.path(), e))?;
        }
        tmp.persist(&target)
            .map_err(|e| CacheError::io(&target, e.error))?;
        Ok(())
    }
}
