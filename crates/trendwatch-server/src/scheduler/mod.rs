//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and, when a cron
//! expression is configured, registers the recurring pipeline run.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trendwatch_pipeline::PipelineConfig;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<PipelineConfig>,
    pipeline_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match pipeline_cron {
        Some(cron) => register_pipeline_job(&scheduler, pool, config, cron).await?,
        None => tracing::info!("scheduler: TRENDWATCH_PIPELINE_CRON not set; no pipeline job"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring pipeline run on `cron` (six-field, seconds first).
///
/// A tick that fires while the previous run is still going is skipped, so
/// at most one scheduled run is in flight.
async fn register_pipeline_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<PipelineConfig>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let in_flight = Arc::new(Mutex::new(()));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            let Ok(_guard) = in_flight.try_lock() else {
                tracing::warn!("scheduler: previous pipeline run still in progress; skipping");
                return;
            };
            run_pipeline_job(&pool, &config).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: pipeline job registered");
    Ok(())
}

async fn run_pipeline_job(pool: &PgPool, config: &PipelineConfig) {
    tracing::info!("scheduler: starting pipeline run");
    match trendwatch_pipeline::run_pipeline(pool, config, "scheduler").await {
        Ok(report) => tracing::info!(
            run_id = report.run_id,
            processed = report.posts_processed,
            "scheduler: pipeline run complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: pipeline run failed"),
    }
}
