//! Pipeline orchestration: raw → processed → topics + trends.

use sqlx::PgPool;
use trendwatch_analysis::{
    detect_anomalies, engagement_score, extract_topics, normalize, sentiment, token_count,
    ModelOutcome, Outlier, SentimentThresholds, Topic,
};
use trendwatch_core::{EngagementCounters, Platform};
use trendwatch_db::{NewProcessedPost, NewTrend, RawPostRow};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Summary of one [`run_pipeline`] invocation.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: i64,
    pub posts_processed: usize,
    pub topics: ModelOutcome<Vec<Topic>>,
    /// Number of trends written, or why detection was skipped.
    pub trends: ModelOutcome<usize>,
}

/// Derive the processed projection of a raw post.
///
/// Pure: normalizes the text, scores engagement for the post's platform and
/// classifies sentiment on the original text.
#[must_use]
pub fn build_processed_post(raw: &RawPostRow, thresholds: &SentimentThresholds) -> NewProcessedPost {
    let platform = Platform::from(raw.platform.as_str());
    let counters = EngagementCounters {
        likes: raw.likes,
        retweets: raw.retweets,
        score: raw.score,
        num_comments: raw.num_comments,
    };
    let normalized_text = normalize(&raw.text);
    let tokens = i32::try_from(token_count(&normalized_text)).unwrap_or(i32::MAX);
    let (label, polarity) = sentiment(&raw.text, thresholds);

    NewProcessedPost {
        raw_post_id: raw.id,
        platform: platform.to_string(),
        original_text: raw.text.clone(),
        normalized_text,
        created_at: raw.created_at,
        ingested_at: raw.ingested_at,
        likes: raw.likes,
        retweets: raw.retweets,
        score: raw.score,
        num_comments: raw.num_comments,
        engagement_score: engagement_score(&platform, &counters),
        token_count: tokens,
        sentiment_label: label.to_string(),
        sentiment_score: polarity,
    }
}

/// Consume every unprocessed raw post.
///
/// Processed rows are inserted and their raw posts marked in one
/// transaction. Returns the number of posts processed; `0` when nothing was
/// pending.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the store fails, including a
/// [`trendwatch_db::DbError::BatchConflict`] when another writer consumed
/// some of the selected posts first.
pub async fn process_pending(pool: &PgPool, config: &PipelineConfig) -> Result<usize, PipelineError> {
    let raws = trendwatch_db::list_unprocessed_raw_posts(pool).await?;
    if raws.is_empty() {
        tracing::info!("no unprocessed posts");
        return Ok(0);
    }

    let batch: Vec<NewProcessedPost> = raws
        .iter()
        .map(|raw| build_processed_post(raw, &config.thresholds))
        .collect();
    for post in &batch {
        tracing::debug!(
            raw_post_id = post.raw_post_id,
            engagement = post.engagement_score,
            sentiment = %post.sentiment_label,
            tokens = post.token_count,
            "processed post"
        );
    }

    let inserted = trendwatch_db::insert_processed_batch(pool, &batch).await?;
    tracing::info!(processed = inserted, "processing stage complete");
    Ok(inserted)
}

/// Fit the topic model over every processed post with normalized text.
///
/// # Errors
///
/// Returns [`PipelineError`] if the store query fails or the topic config is
/// invalid.
pub async fn train_topics(
    pool: &PgPool,
    config: &PipelineConfig,
) -> Result<ModelOutcome<Vec<Topic>>, PipelineError> {
    let texts = trendwatch_db::list_normalized_texts(pool).await?;
    let documents: Vec<&str> = texts.iter().map(String::as_str).collect();
    let outcome = extract_topics(&documents, &config.topics)?;

    if let ModelOutcome::Fitted(topics) = &outcome {
        for topic in topics {
            let words: Vec<&str> = topic.words.iter().map(|w| w.word.as_str()).collect();
            tracing::info!(topic_id = topic.topic_id, words = ?words, "topic");
        }
    }
    Ok(outcome)
}

/// Flag anomalous posts and, when any are found, replace the trend set.
///
/// An empty outlier set leaves the stored trends untouched.
///
/// # Errors
///
/// Returns [`PipelineError`] if a store operation fails or the anomaly
/// config is invalid.
pub async fn detect_trends(
    pool: &PgPool,
    config: &PipelineConfig,
    pipeline_run_id: Option<i64>,
) -> Result<ModelOutcome<Vec<Outlier>>, PipelineError> {
    let samples = trendwatch_db::list_engagement_samples(pool).await?;
    let outcome = detect_anomalies(&samples, &config.anomaly)?;

    if let ModelOutcome::Fitted(outliers) = &outcome {
        if outliers.is_empty() {
            tracing::info!(samples = samples.len(), "no outliers; trend set unchanged");
        } else {
            let trends: Vec<NewTrend> = outliers
                .iter()
                .map(|o| NewTrend {
                    processed_post_id: o.id,
                    anomaly_score: o.anomaly_score,
                })
                .collect();
            let written = trendwatch_db::replace_trends(pool, pipeline_run_id, &trends).await?;
            tracing::info!(trends = written, samples = samples.len(), "trend set replaced");
        }
    }
    Ok(outcome)
}

/// Run every stage in order and record the invocation as a pipeline run.
///
/// # Errors
///
/// Returns [`PipelineError`] if any stage fails; the run row is then marked
/// `failed` on a best-effort basis.
pub async fn run_pipeline(
    pool: &PgPool,
    config: &PipelineConfig,
    trigger_source: &str,
) -> Result<PipelineReport, PipelineError> {
    let run_id = begin_run(pool, trigger_source).await?;

    let report = match run_stages(pool, config, run_id).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(run_id, error = %e, "pipeline run failed");
            fail_run_best_effort(pool, run_id, e.to_string()).await;
            return Err(e);
        }
    };

    let trends = match &report.trends {
        ModelOutcome::Fitted(n) => *n,
        ModelOutcome::InsufficientData { .. } => 0,
    };
    finish_run(pool, run_id, report.posts_processed, trends).await?;
    Ok(report)
}

/// Run trend detection alone, recorded as its own pipeline run so the
/// replaced trends carry a run id.
///
/// # Errors
///
/// Returns [`PipelineError`] if detection or run bookkeeping fails; the run
/// row is then marked `failed` on a best-effort basis.
pub async fn run_detection(
    pool: &PgPool,
    config: &PipelineConfig,
    trigger_source: &str,
) -> Result<(i64, ModelOutcome<Vec<Outlier>>), PipelineError> {
    let run_id = begin_run(pool, trigger_source).await?;

    let outcome = match detect_trends(pool, config, Some(run_id)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(run_id, error = %e, "trend detection run failed");
            fail_run_best_effort(pool, run_id, e.to_string()).await;
            return Err(e);
        }
    };

    let trends = match &outcome {
        ModelOutcome::Fitted(outliers) => outliers.len(),
        ModelOutcome::InsufficientData { .. } => 0,
    };
    finish_run(pool, run_id, 0, trends).await?;
    Ok((run_id, outcome))
}

/// Create a run row and move it to `running`.
async fn begin_run(pool: &PgPool, trigger_source: &str) -> Result<i64, PipelineError> {
    let run = trendwatch_db::create_pipeline_run(pool, trigger_source).await?;
    if let Err(e) = trendwatch_db::start_pipeline_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, e.to_string()).await;
        return Err(e.into());
    }
    tracing::info!(run_id = run.id, trigger = trigger_source, "pipeline run started");
    Ok(run.id)
}

async fn finish_run(
    pool: &PgPool,
    run_id: i64,
    posts_processed: usize,
    trends_detected: usize,
) -> Result<(), PipelineError> {
    let processed = i32::try_from(posts_processed).unwrap_or(i32::MAX);
    let trends = i32::try_from(trends_detected).unwrap_or(i32::MAX);
    if let Err(e) = trendwatch_db::complete_pipeline_run(pool, run_id, processed, trends).await {
        fail_run_best_effort(pool, run_id, e.to_string()).await;
        return Err(e.into());
    }

    tracing::info!(run_id, processed, trends, "pipeline run succeeded");
    Ok(())
}

async fn run_stages(
    pool: &PgPool,
    config: &PipelineConfig,
    run_id: i64,
) -> Result<PipelineReport, PipelineError> {
    let posts_processed = process_pending(pool, config).await?;
    let topics = train_topics(pool, config).await?;
    let trends = match detect_trends(pool, config, Some(run_id)).await? {
        ModelOutcome::Fitted(outliers) => ModelOutcome::Fitted(outliers.len()),
        ModelOutcome::InsufficientData { required, found } => {
            ModelOutcome::InsufficientData { required, found }
        }
    };

    Ok(PipelineReport {
        run_id,
        posts_processed,
        topics,
        trends,
    })
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = trendwatch_db::fail_pipeline_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark pipeline run as failed"
        );
    }
}
