//! Cache Entry Module
//!
//! Write timestamps stored beside each key and the freshness arithmetic on them.

use chrono::{DateTime, Utc};
use serde_json::Value;

// == Expiry Stamp ==
/// Write timestamp of a single cache entry (Unix milliseconds).
///
/// Persisted as the `<key>_expire_time` sibling field of the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpiryStamp {
    /// Time of the last write (Unix milliseconds)
    pub written_at: i64,
}

impl ExpiryStamp {
    // == Constructors ==
    /// Stamp for a write happening now.
    pub fn now() -> Self {
        Self::at(current_timestamp_ms())
    }

    /// Stamp for a write at the given Unix millisecond timestamp.
    pub fn at(written_at: i64) -> Self {
        Self { written_at }
    }

    // == Marker Conversion ==
    /// Parses a stored marker field.
    ///
    /// Accepts a JSON number or a string starting with an integer, so files
    /// written by other tools stay readable. Anything else yields `None`,
    /// which callers treat as an absent deadline.
    pub fn from_marker(marker: &Value) -> Option<Self> {
        match marker {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .map(Self::at),
            Value::String(s) => parse_int_prefix(s).map(Self::at),
            _ => None,
        }
    }

    /// Marker value written to the document.
    pub fn to_marker(self) -> Value {
        Value::from(self.written_at)
    }

    // == Deadline ==
    /// Last instant (Unix milliseconds) at which the entry is still fresh.
    pub fn deadline(&self, ttl_ms: u64) -> i64 {
        let ttl = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
        self.written_at.saturating_add(ttl)
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// Boundary condition: an entry is still fresh when `now` equals the
    /// deadline and expires strictly after it.
    pub fn is_expired_at(&self, ttl_ms: u64, now: i64) -> bool {
        self.deadline(ttl_ms) < now
    }

    /// Checks whether the entry is stale right now.
    pub fn is_expired(&self, ttl_ms: u64) -> bool {
        self.is_expired_at(ttl_ms, current_timestamp_ms())
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at `now`, 0 once expired.
    pub fn ttl_remaining_ms_at(&self, ttl_ms: u64, now: i64) -> u64 {
        let remaining = self.deadline(ttl_ms).saturating_sub(now);
        u64::try_from(remaining).unwrap_or(0)
    }

    /// Write time as a UTC datetime, if representable.
    pub fn written_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.written_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Leading integer of `s`, ignoring leading whitespace and trailing garbage.
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
