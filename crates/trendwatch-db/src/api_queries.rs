//! Read-model queries used by the CLI, export and `trendwatch-server`.

use serde::Serialize;
use sqlx::PgPool;
use trendwatch_core::SentimentLabel;

use crate::processed_posts::ProcessedPostRow;
use crate::trends::{TrendRow, TREND_SELECT};
use crate::DbError;

/// Row counts across the pipeline's tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoreCounts {
    pub raw_posts: i64,
    pub unprocessed_posts: i64,
    pub processed_posts: i64,
    pub trends: i64,
}

/// Input filters for processed-post listing.
///
/// `limit` is `None` to return all matching posts.
#[derive(Debug, Clone, Default)]
pub struct PostListFilters<'a> {
    pub platform: Option<&'a str>,
    pub sentiment: Option<&'a str>,
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Input filters for trend listing.
#[derive(Debug, Clone, Default)]
pub struct TrendListFilters<'a> {
    pub platform: Option<&'a str>,
    pub sentiment: Option<&'a str>,
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Post count and mean polarity for one sentiment label.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SentimentBreakdownRow {
    pub sentiment_label: String,
    pub post_count: i64,
    pub avg_score: f64,
}

impl SentimentBreakdownRow {
    /// `(label, count, mean polarity)`; `None` for a label outside the known set.
    #[must_use]
    pub fn as_group(&self) -> Option<(SentimentLabel, usize, f64)> {
        let label = self.sentiment_label.parse().ok()?;
        let count = usize::try_from(self.post_count).ok()?;
        Some((label, count, self.avg_score))
    }
}

/// Counts raw, unprocessed, processed and trend rows in one round trip.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_store(pool: &PgPool) -> Result<StoreCounts, DbError> {
    let counts = sqlx::query_as::<_, StoreCounts>(
        "SELECT \
             (SELECT COUNT(*) FROM raw_posts) AS raw_posts, \
             (SELECT COUNT(*) FROM raw_posts WHERE processed = false) AS unprocessed_posts, \
             (SELECT COUNT(*) FROM processed_posts) AS processed_posts, \
             (SELECT COUNT(*) FROM trends) AS trends",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Processed posts ordered by engagement (highest first) plus the total
/// number of posts matching the filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_posts_page(
    pool: &PgPool,
    filters: PostListFilters<'_>,
) -> Result<(Vec<ProcessedPostRow>, i64), DbError> {
    let rows = sqlx::query_as::<_, ProcessedPostRow>(
        "SELECT id, raw_post_id, platform, original_text, normalized_text, created_at, \
                ingested_at, likes, retweets, score, num_comments, engagement_score, \
                token_count, sentiment_label, sentiment_score, processed_at \
         FROM processed_posts \
         WHERE ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR sentiment_label = $2) \
         ORDER BY engagement_score DESC, id \
         LIMIT COALESCE($3, 9223372036854775807) OFFSET $4",
    )
    .bind(filters.platform)
    .bind(filters.sentiment)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM processed_posts \
         WHERE ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR sentiment_label = $2)",
    )
    .bind(filters.platform)
    .bind(filters.sentiment)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

/// Trends ordered by anomaly score then engagement (both highest first) plus
/// the total number of trends matching the filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_trends_page(
    pool: &PgPool,
    filters: TrendListFilters<'_>,
) -> Result<(Vec<TrendRow>, i64), DbError> {
    let rows = sqlx::query_as::<_, TrendRow>(&format!(
        "{TREND_SELECT} \
         WHERE ($1::TEXT IS NULL OR p.platform = $1) \
           AND ($2::TEXT IS NULL OR p.sentiment_label = $2) \
         ORDER BY t.anomaly_score DESC, p.engagement_score DESC, t.id \
         LIMIT COALESCE($3, 9223372036854775807) OFFSET $4"
    ))
    .bind(filters.platform)
    .bind(filters.sentiment)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trends t \
         JOIN processed_posts p ON p.id = t.processed_post_id \
         WHERE ($1::TEXT IS NULL OR p.platform = $1) \
           AND ($2::TEXT IS NULL OR p.sentiment_label = $2)",
    )
    .bind(filters.platform)
    .bind(filters.sentiment)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

/// Per-label post counts and mean polarity over all processed posts.
///
/// Labels with no posts are absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn sentiment_breakdown(pool: &PgPool) -> Result<Vec<SentimentBreakdownRow>, DbError> {
    let rows = sqlx::query_as::<_, SentimentBreakdownRow>(
        "SELECT sentiment_label, \
                COUNT(*) AS post_count, \
                AVG(sentiment_score)::DOUBLE PRECISION AS avg_score \
         FROM processed_posts \
         GROUP BY sentiment_label \
         ORDER BY sentiment_label",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
