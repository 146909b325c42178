//! Raw-post ingestion: mock data generation and JSON file loading.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::PgPool;
use trendwatch_db::NewRawPost;

use crate::error::PipelineError;

/// Number of mock posts created when no count is given.
pub const DEFAULT_MOCK_COUNT: usize = 50;

const MOCK_KEYWORDS: &[&str] = &["AI", "ML", "data science", "python", "tech"];
const MOCK_PLATFORMS: &[&str] = &["twitter", "reddit"];

/// Generate `count` synthetic posts created within the 24 hours before `now`.
///
/// Counter ranges: likes 10–1000, retweets 0–500, score 50–5000,
/// comments 5–200.
pub fn generate_mock_posts<R: Rng>(
    rng: &mut R,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<NewRawPost> {
    (0..count)
        .map(|_| {
            let keyword = MOCK_KEYWORDS[rng.random_range(0..MOCK_KEYWORDS.len())];
            let platform = MOCK_PLATFORMS[rng.random_range(0..MOCK_PLATFORMS.len())];
            let tail = if rng.random_bool(0.5) {
                "Amazing new model discovered".to_string()
            } else {
                format!("New breakthrough in {keyword}")
            };

            NewRawPost {
                platform: platform.to_string(),
                text: format!("Breaking: {keyword} revolution! {tail}"),
                created_at: now - Duration::hours(rng.random_range(0..=24)),
                likes: rng.random_range(10..=1000),
                retweets: rng.random_range(0..=500),
                score: rng.random_range(50..=5000),
                num_comments: rng.random_range(5..=200),
            }
        })
        .collect()
}

/// Insert mock posts unless the store already holds raw posts.
///
/// `force` inserts regardless. Returns the number of posts inserted.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the count or insert fails.
pub async fn seed_mock_posts(
    pool: &PgPool,
    count: usize,
    force: bool,
    seed: Option<u64>,
) -> Result<usize, PipelineError> {
    let existing = trendwatch_db::count_raw_posts(pool).await?;
    if existing > 0 && !force {
        tracing::info!(existing, "raw posts already present; skipping mock ingest");
        return Ok(0);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let posts = generate_mock_posts(&mut rng, count, Utc::now());
    let ids = trendwatch_db::insert_raw_posts(pool, &posts).await?;
    tracing::info!(inserted = ids.len(), "mock posts ingested");
    Ok(ids.len())
}

/// Parse a JSON array of raw posts.
///
/// Each element needs `platform` and `created_at` (RFC 3339); `text` and
/// the counters default to empty / zero.
///
/// # Errors
///
/// Returns [`PipelineError::Json`] for malformed input or
/// [`PipelineError::InvalidInput`] for a blank platform.
pub fn parse_posts_json(raw: &str) -> Result<Vec<NewRawPost>, PipelineError> {
    let posts: Vec<NewRawPost> = serde_json::from_str(raw)?;
    if let Some(index) = posts.iter().position(|p| p.platform.trim().is_empty()) {
        return Err(PipelineError::InvalidInput(format!(
            "post {index} has an empty platform"
        )));
    }
    Ok(posts)
}

/// Read and parse a JSON file of raw posts.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be read, otherwise see
/// [`parse_posts_json`].
pub fn load_posts_file(path: &Path) -> Result<Vec<NewRawPost>, PipelineError> {
    let raw = std::fs::read_to_string(path)?;
    parse_posts_json(&raw)
}

/// Load a JSON file of raw posts and insert them in one transaction.
///
/// # Errors
///
/// Returns [`PipelineError`] if reading, parsing or inserting fails.
pub async fn ingest_file(pool: &PgPool, path: &Path) -> Result<usize, PipelineError> {
    let posts = load_posts_file(path)?;
    let ids = trendwatch_db::insert_raw_posts(pool, &posts).await?;
    tracing::info!(inserted = ids.len(), path = %path.display(), "file ingested");
    Ok(ids.len())
}
