//! Offline unit tests for trendwatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use trendwatch_core::{AppConfig, Environment, SentimentLabel};
use trendwatch_db::{DbError, NewRawPost, PipelineRunRow, PoolConfig, SentimentBreakdownRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        sentiment_threshold: 0.05,
        topic_count: 3,
        topic_passes: 5,
        topic_top_words: 5,
        anomaly_contamination: 0.1,
        random_seed: 42,
        pipeline_cron: None,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`PipelineRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn pipeline_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = PipelineRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        posts_processed: 0_i32,
        trends_detected: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.trigger_source, "cli");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
    assert!(row.error_message.is_none());
}

#[test]
fn new_raw_post_counters_default_to_zero_when_absent() {
    let post: NewRawPost = serde_json::from_str(
        r#"{"platform": "twitter", "text": "hello", "created_at": "2026-01-02T03:04:05Z", "likes": 9}"#,
    )
    .expect("valid raw post json");

    assert_eq!(post.platform, "twitter");
    assert_eq!(post.likes, 9);
    assert_eq!(post.retweets, 0);
    assert_eq!(post.score, 0);
    assert_eq!(post.num_comments, 0);
}

#[test]
fn invalid_run_transition_names_expected_status() {
    let err = DbError::InvalidRunTransition {
        id: 7,
        expected_status: "running",
    };
    assert_eq!(
        err.to_string(),
        "pipeline run 7 is not in expected status 'running'"
    );
}

#[test]
fn sentiment_breakdown_row_converts_to_label_group() {
    let row = SentimentBreakdownRow {
        sentiment_label: "negative".to_string(),
        post_count: 4,
        avg_score: -0.25,
    };
    assert_eq!(row.as_group(), Some((SentimentLabel::Negative, 4, -0.25)));

    let unknown = SentimentBreakdownRow {
        sentiment_label: "mixed".to_string(),
        ..row
    };
    assert_eq!(unknown.as_group(), None);
}
