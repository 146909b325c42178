//! Export command handlers.
//!
//! Trends and posts go to stdout unless `--output` is given; the report is
//! written to `trend_report_<timestamp>.<ext>` unless `--output` or
//! `--stdout` says otherwise.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use trendwatch_core::{Platform, SentimentLabel};
use trendwatch_db::PostListFilters;
use trendwatch_pipeline::{ExportFormat, PipelineConfig, PipelineError};

/// Sub-commands available under `export`.
#[derive(Debug, Subcommand)]
pub enum ExportCommands {
    /// Export the current trend set
    Trends {
        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export processed posts
    Posts {
        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Filter by platform
        #[arg(long)]
        platform: Option<String>,
        /// Filter by sentiment label
        #[arg(long)]
        sentiment: Option<SentimentLabel>,
    },
    /// Export the trend report (summary, trends and topics)
    Report {
        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Write to this file instead of the timestamped default
        #[arg(long, conflicts_with = "stdout")]
        output: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
}

/// Run one export sub-command.
///
/// # Errors
///
/// Returns an error if a store query fails or the output cannot be written.
pub(crate) async fn run_export(
    pool: &sqlx::PgPool,
    config: &PipelineConfig,
    command: ExportCommands,
) -> anyhow::Result<()> {
    match command {
        ExportCommands::Trends { format, output } => {
            let trends = trendwatch_db::list_trends(pool, None).await?;
            emit(output.as_deref(), |out| {
                trendwatch_pipeline::write_trends(out, &trends, format)
            })?;
            report_written(output.as_deref(), trends.len(), "trend");
        }
        ExportCommands::Posts {
            format,
            output,
            platform,
            sentiment,
        } => {
            let platform = platform.map(|p| Platform::from(p.as_str()).to_string());
            let (posts, _) = trendwatch_db::list_posts_page(
                pool,
                PostListFilters {
                    platform: platform.as_deref(),
                    sentiment: sentiment.map(SentimentLabel::as_str),
                    limit: None,
                    offset: 0,
                },
            )
            .await?;
            emit(output.as_deref(), |out| {
                trendwatch_pipeline::write_posts(out, &posts, format)
            })?;
            report_written(output.as_deref(), posts.len(), "post");
        }
        ExportCommands::Report {
            format,
            output,
            stdout,
        } => {
            let report = trendwatch_pipeline::build_report(pool, config).await?;
            let target = if stdout {
                None
            } else {
                Some(output.unwrap_or_else(|| {
                    PathBuf::from(trendwatch_pipeline::default_report_filename(
                        report.generated_at,
                        format,
                    ))
                }))
            };
            emit(target.as_deref(), |out| {
                trendwatch_pipeline::write_report(out, &report, format)
            })?;
            report_written(target.as_deref(), report.trends.len(), "trend");
        }
    }
    Ok(())
}

/// Write to `path` when given, otherwise to stdout.
fn emit<F>(path: Option<&Path>, write: F) -> Result<(), PipelineError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), PipelineError>,
{
    match path {
        Some(path) => {
            trendwatch_pipeline::export_to_file(path, |out| write(out))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn report_written(path: Option<&Path>, records: usize, noun: &str) {
    if let Some(path) = path {
        eprintln!(
            "exported {records} {noun} record(s) to {} at {}",
            path.display(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
