//! JSON File Cache - A persistent key-value cache in a single JSON file
//!
//! Memoizes expensive lookups across process invocations with one global TTL
//! and a guard that disables writes on read-only deployments.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;

pub use cache::{FileCache, WriteOutcome};
pub use config::Config;
pub use error::CacheError;
