//! Live pipeline tests against a fresh migrated Postgres per test.

use chrono::{Duration, Utc};
use trendwatch_analysis::ModelOutcome;
use trendwatch_db::{
    count_store, get_pipeline_run, insert_raw_posts, list_trends, list_unprocessed_raw_posts,
    NewRawPost,
};
use trendwatch_pipeline::{
    build_report, detect_trends, process_pending, run_detection, run_pipeline, seed_mock_posts,
    PipelineConfig,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TOPIC_TEXTS: &[&str] = &[
    "python library release brings faster dataframe parsing",
    "rust compiler update improves borrow checker errors",
    "football match ends with dramatic penalty shootout",
    "python notebook tips for data cleaning workflows",
    "basketball playoffs bring record crowds downtown",
];

/// Twenty twitter posts with modest likes plus one runaway outlier.
fn corpus() -> Vec<NewRawPost> {
    let mut posts: Vec<NewRawPost> = (0..20_i64)
        .map(|i| NewRawPost {
            platform: "twitter".to_string(),
            text: format!("{} update {i}", TOPIC_TEXTS[usize::try_from(i).unwrap() % TOPIC_TEXTS.len()]),
            created_at: Utc::now() - Duration::hours(i),
            likes: 100 + i,
            retweets: 10,
            score: 0,
            num_comments: 0,
        })
        .collect();
    posts.push(NewRawPost {
        platform: "twitter".to_string(),
        text: "Amazing breakthrough in python tooling".to_string(),
        created_at: Utc::now(),
        likes: 90_000,
        retweets: 40_000,
        score: 0,
        num_comments: 0,
    });
    posts
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn run_processes_every_pending_post_and_flags_the_outlier(pool: sqlx::PgPool) {
    insert_raw_posts(&pool, &corpus()).await.expect("insert failed");

    let report = run_pipeline(&pool, &PipelineConfig::default(), "test")
        .await
        .expect("run_pipeline failed");

    assert_eq!(report.posts_processed, 21);
    assert!(report.topics.is_fitted());
    assert!(matches!(report.trends, ModelOutcome::Fitted(n) if n >= 1));

    let counts = count_store(&pool).await.expect("count_store failed");
    assert_eq!(counts.processed_posts, 21);
    assert_eq!(counts.unprocessed_posts, 0);

    let trends = list_trends(&pool, None).await.expect("list_trends failed");
    assert_eq!(trends[0].original_text, "Amazing breakthrough in python tooling");
    assert!(trends.iter().all(|t| t.is_viral));
    assert!(trends.iter().all(|t| t.pipeline_run_id == Some(report.run_id)));

    let run = get_pipeline_run(&pool, report.run_id)
        .await
        .expect("get_pipeline_run failed");
    assert_eq!(run.status, "succeeded");
    assert_eq!(run.trigger_source, "test");
    assert_eq!(run.posts_processed, 21);
    assert_eq!(usize::try_from(run.trends_detected).unwrap(), trends.len());
    assert!(run.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_run_processes_nothing_new(pool: sqlx::PgPool) {
    insert_raw_posts(&pool, &corpus()).await.expect("insert failed");
    let config = PipelineConfig::default();

    run_pipeline(&pool, &config, "test").await.expect("first run failed");
    let first = list_trends(&pool, None).await.expect("list_trends failed");

    let second = run_pipeline(&pool, &config, "test").await.expect("second run failed");
    assert_eq!(second.posts_processed, 0);

    let after = list_trends(&pool, None).await.expect("list_trends failed");
    let ids = |rows: &[trendwatch_db::TrendRow]| {
        rows.iter().map(|t| t.processed_post_id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&after));
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_on_empty_store_succeeds_with_insufficient_data(pool: sqlx::PgPool) {
    let report = run_pipeline(&pool, &PipelineConfig::default(), "test")
        .await
        .expect("run_pipeline failed");

    assert_eq!(report.posts_processed, 0);
    assert!(matches!(
        report.topics,
        ModelOutcome::InsufficientData { found: 0, .. }
    ));
    assert!(matches!(
        report.trends,
        ModelOutcome::InsufficientData { found: 0, .. }
    ));

    let run = get_pipeline_run(&pool, report.run_id)
        .await
        .expect("get_pipeline_run failed");
    assert_eq!(run.status, "succeeded");
    assert_eq!(run.trends_detected, 0);
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn process_pending_marks_exactly_the_consumed_posts(pool: sqlx::PgPool) {
    insert_raw_posts(&pool, &corpus()[..3]).await.expect("insert failed");

    let processed = process_pending(&pool, &PipelineConfig::default())
        .await
        .expect("process_pending failed");
    assert_eq!(processed, 3);
    assert!(list_unprocessed_raw_posts(&pool)
        .await
        .expect("list failed")
        .is_empty());

    let again = process_pending(&pool, &PipelineConfig::default())
        .await
        .expect("process_pending failed");
    assert_eq!(again, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn detection_below_minimum_keeps_existing_trends(pool: sqlx::PgPool) {
    insert_raw_posts(&pool, &corpus()[..4]).await.expect("insert failed");
    let config = PipelineConfig::default();
    process_pending(&pool, &config).await.expect("process failed");

    let outcome = detect_trends(&pool, &config, None).await.expect("detect failed");
    assert_eq!(
        outcome,
        ModelOutcome::InsufficientData {
            required: 5,
            found: 4
        }
    );
    assert!(list_trends(&pool, None).await.expect("list failed").is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn standalone_detection_records_its_own_run(pool: sqlx::PgPool) {
    insert_raw_posts(&pool, &corpus()).await.expect("insert failed");
    let config = PipelineConfig::default();
    process_pending(&pool, &config).await.expect("process failed");

    let (run_id, outcome) = run_detection(&pool, &config, "cli")
        .await
        .expect("run_detection failed");
    let outliers = outcome.fitted().expect("enough samples");
    assert!(!outliers.is_empty());

    let trends = list_trends(&pool, None).await.expect("list_trends failed");
    assert_eq!(trends.len(), outliers.len());
    assert!(trends.iter().all(|t| t.pipeline_run_id == Some(run_id)));

    let run = get_pipeline_run(&pool, run_id)
        .await
        .expect("get_pipeline_run failed");
    assert_eq!(run.status, "succeeded");
    assert_eq!(run.trigger_source, "cli");
    assert_eq!(run.posts_processed, 0);
    assert_eq!(usize::try_from(run.trends_detected).unwrap(), outliers.len());
}

// ---------------------------------------------------------------------------
// Ingestion and report
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn mock_seeding_only_fills_an_empty_store(pool: sqlx::PgPool) {
    let inserted = seed_mock_posts(&pool, 50, false, Some(42))
        .await
        .expect("seed failed");
    assert_eq!(inserted, 50);

    let skipped = seed_mock_posts(&pool, 50, false, Some(42))
        .await
        .expect("seed failed");
    assert_eq!(skipped, 0);

    let forced = seed_mock_posts(&pool, 5, true, Some(42))
        .await
        .expect("seed failed");
    assert_eq!(forced, 5);
    assert_eq!(count_store(&pool).await.expect("count failed").raw_posts, 55);
}

#[sqlx::test(migrations = "../../migrations")]
async fn report_summarises_the_store(pool: sqlx::PgPool) {
    insert_raw_posts(&pool, &corpus()).await.expect("insert failed");
    let config = PipelineConfig::default();
    run_pipeline(&pool, &config, "test").await.expect("run failed");

    let report = build_report(&pool, &config).await.expect("build_report failed");
    assert_eq!(report.summary.total_posts, 21);
    assert_eq!(report.summary.anomalies_detected, report.trends.len());
    assert_eq!(report.summary.total_topics, 3);
    assert_eq!(report.topics.len(), 3);
}
