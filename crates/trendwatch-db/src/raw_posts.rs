//! Database operations for the `raw_posts` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `raw_posts` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RawPostRow {
    pub id: i64,
    pub platform: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub likes: i64,
    pub retweets: i64,
    pub score: i64,
    pub num_comments: i64,
    pub processed: bool,
}

/// A post to ingest. `ingested_at` defaults to `NOW()` and `processed` to `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRawPost {
    pub platform: String,
    #[serde(default)]
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub retweets: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
}

/// Insert raw posts in one transaction and return their generated ids.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is written then.
pub async fn insert_raw_posts(pool: &PgPool, posts: &[NewRawPost]) -> Result<Vec<i64>, DbError> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(posts.len());

    for post in posts {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO raw_posts \
                 (platform, text, created_at, likes, retweets, score, num_comments) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(&post.platform)
        .bind(&post.text)
        .bind(post.created_at)
        .bind(post.likes)
        .bind(post.retweets)
        .bind(post.score)
        .bind(post.num_comments)
        .fetch_one(&mut *tx)
        .await?;
        ids.push(id);
    }

    tx.commit().await?;
    Ok(ids)
}

/// All raw posts not yet consumed by the pipeline, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unprocessed_raw_posts(pool: &PgPool) -> Result<Vec<RawPostRow>, DbError> {
    let rows = sqlx::query_as::<_, RawPostRow>(
        "SELECT id, platform, text, created_at, ingested_at, \
                likes, retweets, score, num_comments, processed \
         FROM raw_posts \
         WHERE processed = false \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Total number of raw posts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_raw_posts(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_posts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
