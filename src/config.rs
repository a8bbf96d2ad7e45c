//! Configuration Module
//!
//! Handles loading the cache configuration from environment variables.

use std::env;
use std::path::{Path, PathBuf};

use crate::cache::{DEFAULT_CACHE_FILE, DEFAULT_TTL_MS};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Absolute location of the JSON cache file
    pub cache_path: PathBuf,
    /// Global TTL in milliseconds applied to every key
    pub ttl_ms: u64,
    /// When set, mutating operations are skipped
    pub read_only: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FILE_CACHE_PATH` - Cache file, relative to the working directory (default: data.json)
    /// - `FILE_CACHE_TTL_MS` - TTL in milliseconds (default: 10^12)
    /// - `FILE_CACHE_READ_ONLY` - Force the read-only guard (`1`, `true` or `yes`)
    /// - `VERCEL` and `NODE_ENV` - `1` and `production` together enable the read-only guard
    pub fn from_env() -> Self {
        let cache_path = env::var("FILE_CACHE_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CACHE_FILE.to_string());

        let forced = env::var("FILE_CACHE_READ_ONLY")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self {
            cache_path: resolve_path(cache_path),
            ttl_ms: env::var("FILE_CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_MS),
            read_only: forced
                || is_read_only_deployment(
                    env::var("VERCEL").ok().as_deref(),
                    env::var("NODE_ENV").ok().as_deref(),
                ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: resolve_path(DEFAULT_CACHE_FILE),
            ttl_ms: DEFAULT_TTL_MS,
            read_only: false,
        }
    }
}

/// Detects the managed serverless production platform whose filesystem is
/// read-only at runtime.
pub fn is_read_only_deployment(platform: Option<&str>, mode: Option<&str>) -> bool {
    platform == Some("1") && mode == Some("production")
}

/// Resolves a relative path against the current working directory.
///
/// Falls back to the path as given when the working directory is unavailable.
pub fn resolve_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
