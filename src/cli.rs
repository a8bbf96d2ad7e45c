//! Command-line interface for the file cache
//!
//! Parses arguments with clap and runs one cache operation per invocation,
//! rendering the result as a JSON document.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::warn;

use crate::cache::FileCache;
use crate::config::{resolve_path, Config};
use crate::models::{GetResponse, KeysResponse, PurgeResponse, WriteResponse, WriteStatus};

/// Persistent JSON file cache
#[derive(Parser, Debug)]
#[command(name = "filecache")]
#[command(about = "Inspect and modify a JSON file cache")]
#[command(version)]
pub struct Cli {
    /// Cache file, relative to the working directory (overrides FILE_CACHE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// TTL in milliseconds (overrides FILE_CACHE_TTL_MS)
    #[arg(long, global = true, value_name = "MS")]
    pub ttl_ms: Option<u64>,

    /// Skip every write, as in a read-only deployment
    #[arg(long, global = true)]
    pub read_only: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Cache operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the fresh value stored under KEY
    Get { key: String },

    /// Store VALUE under KEY
    ///
    /// VALUE is parsed as JSON; anything that is not valid JSON is stored as a string.
    Set {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Remove KEY and its expiry marker
    Del { key: String },

    /// Replace the whole cache with an empty object
    Clear,

    /// List fresh keys
    Keys,

    /// Remove expired entries from the file
    Purge,
}

impl Cli {
    /// Applies command-line overrides on top of environment configuration.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(file) = &self.file {
            config.cache_path = resolve_path(file);
        }
        if let Some(ttl_ms) = self.ttl_ms {
            config.ttl_ms = ttl_ms;
        }
        if self.read_only {
            config.read_only = true;
        }
        config
    }
}

/// Interprets a command-line value as JSON, falling back to a plain string.
pub fn parse_value_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Runs `command` against `cache` and renders its JSON output.
pub fn execute(cache: &FileCache, command: &Command) -> serde_json::Result<String> {
    match command {
        Command::Get { key } => serde_json::to_string(&GetResponse::new(key, cache.get_entry(key))),
        Command::Set { key, value } => {
            let value = parse_value_arg(value);
            render_write(WriteResponse::new("set", Some(key.as_str()), cache.try_set(key, &value)))
        }
        Command::Del { key } => {
            render_write(WriteResponse::new(
                "delete",
                Some(key.as_str()),
                cache.try_delete(key),
            ))
        }
        Command::Clear => render_write(WriteResponse::new("clear", None, cache.try_clear())),
        Command::Keys => serde_json::to_string(&KeysResponse::new(cache.keys())),
        Command::Purge => serde_json::to_string(&PurgeResponse {
            removed: cache.purge_expired(),
        }),
    }
}

fn render_write(response: WriteResponse) -> serde_json::Result<String> {
    if response.outcome == WriteStatus::Failed {
        warn!(
            operation = %response.operation,
            error = response.error.as_deref().unwrap_or_default(),
            "[Cache] Unable to write cache file"
        );
    }
    serde_json::to_string(&response)
}
