//! Pipeline command handlers: full runs, single stages and run history.

use clap::Subcommand;
use trendwatch_analysis::ModelOutcome;
use trendwatch_pipeline::PipelineConfig;

/// Sub-commands available under `pipeline`.
#[derive(Debug, Subcommand)]
pub enum PipelineCommands {
    /// Process pending posts, fit topics and detect trends
    Run,
    /// Process pending raw posts only
    Process,
    /// Fit the topic model and print its topics
    Topics,
    /// Detect anomalous posts and replace the trend set
    Detect,
    /// Show recent pipeline runs
    Runs {
        /// Maximum number of runs to show (1-200)
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(i64).range(1..=200))]
        limit: i64,
    },
}

pub(crate) async fn run_pipeline_once(
    pool: &sqlx::PgPool,
    config: &PipelineConfig,
) -> anyhow::Result<()> {
    let report = trendwatch_pipeline::run_pipeline(pool, config, "cli").await?;

    println!("run {} succeeded", report.run_id);
    println!("  posts processed: {}", report.posts_processed);
    match &report.topics {
        ModelOutcome::Fitted(topics) => println!("  topics: {}", topics.len()),
        ModelOutcome::InsufficientData { required, found } => {
            println!("  topics: skipped ({found} documents, need {required})");
        }
    }
    match report.trends {
        ModelOutcome::Fitted(n) => println!("  trends detected: {n}"),
        ModelOutcome::InsufficientData { required, found } => {
            println!("  trends: skipped ({found} posts, need {required})");
        }
    }
    Ok(())
}

pub(crate) async fn run_process(pool: &sqlx::PgPool, config: &PipelineConfig) -> anyhow::Result<()> {
    let processed = trendwatch_pipeline::process_pending(pool, config).await?;
    println!("processed {processed} post(s)");
    Ok(())
}

pub(crate) async fn run_topics(pool: &sqlx::PgPool, config: &PipelineConfig) -> anyhow::Result<()> {
    match trendwatch_pipeline::train_topics(pool, config).await? {
        ModelOutcome::Fitted(topics) => {
            for topic in &topics {
                let words: Vec<String> = topic
                    .words
                    .iter()
                    .map(|w| format!("{} ({:.3})", w.word, w.probability))
                    .collect();
                println!("topic {}: {}", topic.topic_id, words.join(", "));
            }
        }
        ModelOutcome::InsufficientData { required, found } => {
            println!("not enough documents for topic modelling ({found}, need {required})");
        }
    }
    Ok(())
}

pub(crate) async fn run_detect(pool: &sqlx::PgPool, config: &PipelineConfig) -> anyhow::Result<()> {
    let (run_id, outcome) = trendwatch_pipeline::run_detection(pool, config, "cli").await?;
    println!("run {run_id} succeeded");
    match outcome {
        ModelOutcome::Fitted(outliers) if outliers.is_empty() => {
            println!("no outliers found; trend set unchanged");
        }
        ModelOutcome::Fitted(outliers) => {
            println!("{:<10}{:<14}ANOMALY", "POST", "ENGAGEMENT");
            for o in &outliers {
                println!("{:<10}{:<14.1}{:.4}", o.id, o.engagement_score, o.anomaly_score);
            }
        }
        ModelOutcome::InsufficientData { required, found } => {
            println!("not enough posts for anomaly detection ({found}, need {required})");
        }
    }
    Ok(())
}

pub(crate) async fn run_list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = trendwatch_db::list_pipeline_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no pipeline runs recorded; run `pipeline run` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<12}{:<10}{:<18}{:<11}{:<8}ERROR",
        "ID", "STATUS", "TRIGGER", "CREATED", "PROCESSED", "TRENDS"
    );
    for run in &runs {
        println!(
            "{:<8}{:<12}{:<10}{:<18}{:<11}{:<8}{}",
            run.id,
            run.status,
            run.trigger_source,
            run.created_at.format("%Y-%m-%d %H:%M").to_string(),
            run.posts_processed,
            run.trends_detected,
            run.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
