//! Database operations for the `trends` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A trend joined with the processed post it flags.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendRow {
    pub id: i64,
    pub processed_post_id: i64,
    pub pipeline_run_id: Option<i64>,
    pub anomaly_score: f64,
    pub is_viral: bool,
    pub detected_at: DateTime<Utc>,
    pub platform: String,
    pub original_text: String,
    pub normalized_text: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub retweets: i64,
    pub score: i64,
    pub num_comments: i64,
    pub engagement_score: f64,
    pub sentiment_label: String,
    pub sentiment_score: f64,
}

/// A processed post selected as an outlier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewTrend {
    pub processed_post_id: i64,
    pub anomaly_score: f64,
}

pub(crate) const TREND_SELECT: &str = "SELECT t.id, t.processed_post_id, t.pipeline_run_id, \
            t.anomaly_score, t.is_viral, t.detected_at, \
            p.platform, p.original_text, p.normalized_text, p.created_at, \
            p.likes, p.retweets, p.score, p.num_comments, \
            p.engagement_score, p.sentiment_label, p.sentiment_score \
     FROM trends t \
     JOIN processed_posts p ON p.id = t.processed_post_id";

/// Replace the whole trend set with `trends` in one transaction.
///
/// Readers see either the previous set or the new one. An empty slice
/// leaves the store untouched and returns `0`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails (including a foreign-key
/// violation for an unknown processed post); the previous set is kept.
pub async fn replace_trends(
    pool: &PgPool,
    pipeline_run_id: Option<i64>,
    trends: &[NewTrend],
) -> Result<usize, DbError> {
    if trends.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM trends").execute(&mut *tx).await?;

    for trend in trends {
        sqlx::query(
            "INSERT INTO trends (processed_post_id, pipeline_run_id, anomaly_score, is_viral) \
             VALUES ($1, $2, $3, true)",
        )
        .bind(trend.processed_post_id)
        .bind(pipeline_run_id)
        .bind(trend.anomaly_score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(trends.len())
}

/// Current trends, most anomalous first (ties broken by engagement).
///
/// `limit` is `None` to return the whole set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trends(pool: &PgPool, limit: Option<i64>) -> Result<Vec<TrendRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendRow>(&format!(
        "{TREND_SELECT} \
         ORDER BY t.anomaly_score DESC, p.engagement_score DESC, t.id \
         LIMIT COALESCE($1, 9223372036854775807)"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Number of rows in the trend set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_trends(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trends")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
