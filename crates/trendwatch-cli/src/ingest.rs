//! Raw-post ingestion command handlers.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use trendwatch_pipeline::DEFAULT_MOCK_COUNT;

/// Sub-commands available under `ingest`.
#[derive(Debug, Subcommand)]
pub enum IngestCommands {
    /// Insert synthetic posts (only into an empty store unless --force)
    Mock {
        /// Number of posts to generate
        #[arg(long, default_value_t = DEFAULT_MOCK_COUNT)]
        count: usize,
        /// Insert even if raw posts already exist
        #[arg(long)]
        force: bool,
        /// Seed for reproducible mock data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Insert posts from a JSON array file
    File {
        /// Path to the JSON file
        path: PathBuf,
    },
}

pub(crate) async fn run_ingest_mock(
    pool: &sqlx::PgPool,
    count: usize,
    force: bool,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let inserted = trendwatch_pipeline::seed_mock_posts(pool, count, force, seed).await?;
    if inserted == 0 {
        println!("raw posts already present; use --force to add mock data anyway");
    } else {
        println!("inserted {inserted} mock post(s)");
    }
    Ok(())
}

/// Insert every post in a JSON file in one transaction.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the insert fails.
pub(crate) async fn run_ingest_file(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let inserted = trendwatch_pipeline::ingest_file(pool, path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to ingest {}: {e}", path.display()))?;
    println!("inserted {inserted} post(s) from {}", path.display());
    Ok(())
}
