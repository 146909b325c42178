//! Database operations for the `processed_posts` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `processed_posts` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessedPostRow {
    pub id: i64,
    pub raw_post_id: i64,
    pub platform: String,
    pub original_text: String,
    pub normalized_text: String,
    pub created_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub likes: i64,
    pub retweets: i64,
    pub score: i64,
    pub num_comments: i64,
    pub engagement_score: f64,
    pub token_count: i32,
    pub sentiment_label: String,
    pub sentiment_score: f64,
    pub processed_at: DateTime<Utc>,
}

/// A processed projection of one raw post, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProcessedPost {
    pub raw_post_id: i64,
    pub platform: String,
    pub original_text: String,
    pub normalized_text: String,
    pub created_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub likes: i64,
    pub retweets: i64,
    pub score: i64,
    pub num_comments: i64,
    pub engagement_score: f64,
    pub token_count: i32,
    pub sentiment_label: String,
    pub sentiment_score: f64,
}

/// Insert processed posts and mark their source raw posts consumed, atomically.
///
/// Only raw posts still `processed = false` are marked. If fewer rows are
/// marked than posts given, another writer consumed some of them first: the
/// transaction is rolled back and nothing is written.
///
/// Returns the number of processed posts inserted.
///
/// # Errors
///
/// Returns [`DbError::BatchConflict`] on a lost race, or [`DbError::Sqlx`]
/// if any statement fails.
pub async fn insert_processed_batch(
    pool: &PgPool,
    posts: &[NewProcessedPost],
) -> Result<usize, DbError> {
    if posts.is_empty() {
        return Ok(0);
    }

    let raw_ids: Vec<i64> = posts.iter().map(|p| p.raw_post_id).collect();
    let mut tx = pool.begin().await?;

    let marked = sqlx::query(
        "UPDATE raw_posts SET processed = true \
         WHERE id = ANY($1) AND processed = false",
    )
    .bind(&raw_ids)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if usize::try_from(marked).ok() != Some(posts.len()) {
        tx.rollback().await?;
        return Err(DbError::BatchConflict {
            expected: posts.len(),
            marked,
        });
    }

    for post in posts {
        sqlx::query(
            "INSERT INTO processed_posts \
                 (raw_post_id, platform, original_text, normalized_text, created_at, \
                  ingested_at, likes, retweets, score, num_comments, engagement_score, \
                  token_count, sentiment_label, sentiment_score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(post.raw_post_id)
        .bind(&post.platform)
        .bind(&post.original_text)
        .bind(&post.normalized_text)
        .bind(post.created_at)
        .bind(post.ingested_at)
        .bind(post.likes)
        .bind(post.retweets)
        .bind(post.score)
        .bind(post.num_comments)
        .bind(post.engagement_score)
        .bind(post.token_count)
        .bind(&post.sentiment_label)
        .bind(post.sentiment_score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(posts.len())
}

/// Normalized text of every processed post that has any, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_normalized_texts(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT normalized_text FROM processed_posts \
         WHERE normalized_text <> '' \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// `(id, engagement_score)` for every processed post, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_engagement_samples(pool: &PgPool) -> Result<Vec<(i64, f64)>, DbError> {
    let rows = sqlx::query_as::<_, (i64, f64)>(
        "SELECT id, engagement_score FROM processed_posts ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
