mod export;
mod ingest;
mod pipeline;
mod query;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendwatch_core::AppConfig;

use crate::export::ExportCommands;
use crate::ingest::IngestCommands;
use crate::pipeline::PipelineCommands;
use crate::query::{PostsCommands, SentimentCommands, TrendsCommands};

#[derive(Debug, Parser)]
#[command(name = "trendwatch-cli")]
#[command(about = "Social media trend detection pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database connectivity and migrations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Load raw posts into the store
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },
    /// Run the pipeline or one of its stages
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Inspect detected trends
    Trends {
        #[command(subcommand)]
        command: TrendsCommands,
    },
    /// Inspect processed posts
    Posts {
        #[command(subcommand)]
        command: PostsCommands,
    },
    /// Sentiment statistics over processed posts
    Sentiment {
        #[command(subcommand)]
        command: SentimentCommands,
    },
    /// Export trends, posts or the trend report as JSON or CSV
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("trendwatch-cli: run with --help to list commands");
        return Ok(());
    };

    let config = trendwatch_core::load_app_config_from_env()?;
    init_tracing(&config.log_level);

    let pool = trendwatch_db::connect_pool(
        &config.database_url,
        trendwatch_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    tracing::debug!(command = ?command, env = %config.env, "running command");
    let result = dispatch(&pool, &config, command).await;
    pool.close().await;
    result
}

fn init_tracing(fallback_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn dispatch(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: Commands,
) -> anyhow::Result<()> {
    let pipeline_config = trendwatch_pipeline::PipelineConfig::from_app_config(config);

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                trendwatch_db::health_check(pool).await?;
                println!("database reachable");
            }
            DbCommands::Migrate => {
                let applied = trendwatch_db::run_migrations(pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Ingest { command } => match command {
            IngestCommands::Mock { count, force, seed } => {
                ingest::run_ingest_mock(pool, count, force, seed).await?;
            }
            IngestCommands::File { path } => ingest::run_ingest_file(pool, &path).await?,
        },
        Commands::Pipeline { command } => match command {
            PipelineCommands::Run => pipeline::run_pipeline_once(pool, &pipeline_config).await?,
            PipelineCommands::Process => pipeline::run_process(pool, &pipeline_config).await?,
            PipelineCommands::Topics => pipeline::run_topics(pool, &pipeline_config).await?,
            PipelineCommands::Detect => pipeline::run_detect(pool, &pipeline_config).await?,
            PipelineCommands::Runs { limit } => pipeline::run_list_runs(pool, limit).await?,
        },
        Commands::Trends { command } => match command {
            TrendsCommands::List {
                limit,
                platform,
                sentiment,
            } => {
                query::run_trends_list(pool, limit, platform.as_deref(), sentiment)
                    .await?;
            }
        },
        Commands::Posts { command } => match command {
            PostsCommands::List {
                limit,
                platform,
                sentiment,
            } => {
                query::run_posts_list(pool, limit, platform.as_deref(), sentiment)
                    .await?;
            }
        },
        Commands::Sentiment { command } => match command {
            SentimentCommands::Stats => query::run_sentiment_stats(pool).await?,
        },
        Commands::Export { command } => {
            export::run_export(pool, &pipeline_config, command).await?;
        }
    }

    Ok(())
}
