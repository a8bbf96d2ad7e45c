//! JSON File Cache - command-line front end
//!
//! Runs a single cache operation and prints its result as JSON on stdout.

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use json_file_cache::cli::{execute, Cli};
use json_file_cache::{Config, FileCache};

/// Main entry point for the `filecache` tool.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging (stderr)
/// 2. Parse command-line arguments
/// 3. Load configuration from environment variables, then apply CLI overrides
/// 4. Run the requested operation and print its JSON output
/// 5. Log the cache statistics at debug level
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "json_file_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.apply(Config::from_env());
    debug!(
        "Configuration loaded: path={}, ttl={}ms, read_only={}",
        config.cache_path.display(),
        config.ttl_ms,
        config.read_only
    );

    let cache = FileCache::from_config(&config);
    let output = execute(&cache, &cli.command).context("Failed to render command output")?;
    println!("{}", output);

    let stats = cache.stats();
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        writes = stats.writes,
        skipped_writes = stats.skipped_writes,
        failed_writes = stats.failed_writes,
        hit_rate = stats.hit_rate(),
        "Cache stats"
    );

    Ok(())
}
