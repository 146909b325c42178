//! JSON and CSV export of trends, processed posts and the trend report.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use trendwatch_analysis::{ModelOutcome, Topic};
use trendwatch_db::{ProcessedPostRow, TrendRow};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::orchestrator::train_topics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(PipelineError::InvalidInput(format!(
                "unsupported export format '{other}' (expected json or csv)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_posts: i64,
    pub total_topics: usize,
    pub anomalies_detected: usize,
}

/// Snapshot of the current trend set plus a freshly fitted topic model.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub trends: Vec<TrendRow>,
    pub topics: Vec<Topic>,
}

/// Assemble a [`TrendReport`] from the store.
///
/// Topics are empty when the corpus is too small to fit a model.
///
/// # Errors
///
/// Returns [`PipelineError`] if a store query fails or the topic config is
/// invalid.
pub async fn build_report(
    pool: &PgPool,
    config: &PipelineConfig,
) -> Result<TrendReport, PipelineError> {
    let counts = trendwatch_db::count_store(pool).await?;
    let trends = trendwatch_db::list_trends(pool, None).await?;
    let topics = match train_topics(pool, config).await? {
        ModelOutcome::Fitted(topics) => topics,
        ModelOutcome::InsufficientData { .. } => Vec::new(),
    };

    Ok(TrendReport {
        generated_at: Utc::now(),
        summary: ReportSummary {
            total_posts: counts.processed_posts,
            total_topics: topics.len(),
            anomalies_detected: trends.len(),
        },
        trends,
        topics,
    })
}

/// `trend_report_YYYYMMDD_HHMMSS.<ext>`
#[must_use]
pub fn default_report_filename(now: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "trend_report_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

const TREND_HEADER: &[&str] = &[
    "id",
    "processed_post_id",
    "platform",
    "original_text",
    "created_at",
    "engagement_score",
    "anomaly_score",
    "sentiment_label",
    "sentiment_score",
    "is_viral",
    "detected_at",
];

const POST_HEADER: &[&str] = &[
    "id",
    "raw_post_id",
    "platform",
    "original_text",
    "normalized_text",
    "created_at",
    "likes",
    "retweets",
    "score",
    "num_comments",
    "engagement_score",
    "token_count",
    "sentiment_label",
    "sentiment_score",
];

/// Write trends as pretty JSON or CSV.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] or [`PipelineError::Json`] if writing fails.
pub fn write_trends<W: Write + ?Sized>(
    out: &mut W,
    trends: &[TrendRow],
    format: ExportFormat,
) -> Result<(), PipelineError> {
    match format {
        ExportFormat::Json => write_json(out, trends),
        ExportFormat::Csv => {
            write_csv_record(out, TREND_HEADER)?;
            for t in trends {
                write_csv_record(
                    out,
                    [
                        t.id.to_string(),
                        t.processed_post_id.to_string(),
                        t.platform.clone(),
                        t.original_text.clone(),
                        t.created_at.to_rfc3339(),
                        t.engagement_score.to_string(),
                        t.anomaly_score.to_string(),
                        t.sentiment_label.clone(),
                        t.sentiment_score.to_string(),
                        t.is_viral.to_string(),
                        t.detected_at.to_rfc3339(),
                    ],
                )?;
            }
            Ok(())
        }
    }
}

/// Write processed posts as pretty JSON or CSV.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] or [`PipelineError::Json`] if writing fails.
pub fn write_posts<W: Write + ?Sized>(
    out: &mut W,
    posts: &[ProcessedPostRow],
    format: ExportFormat,
) -> Result<(), PipelineError> {
    match format {
        ExportFormat::Json => write_json(out, posts),
        ExportFormat::Csv => {
            write_csv_record(out, POST_HEADER)?;
            for p in posts {
                write_csv_record(
                    out,
                    [
                        p.id.to_string(),
                        p.raw_post_id.to_string(),
                        p.platform.clone(),
                        p.original_text.clone(),
                        p.normalized_text.clone(),
                        p.created_at.to_rfc3339(),
                        p.likes.to_string(),
                        p.retweets.to_string(),
                        p.score.to_string(),
                        p.num_comments.to_string(),
                        p.engagement_score.to_string(),
                        p.token_count.to_string(),
                        p.sentiment_label.clone(),
                        p.sentiment_score.to_string(),
                    ],
                )?;
            }
            Ok(())
        }
    }
}

/// Write the report. CSV holds only the trend rows.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] or [`PipelineError::Json`] if writing fails.
pub fn write_report<W: Write + ?Sized>(
    out: &mut W,
    report: &TrendReport,
    format: ExportFormat,
) -> Result<(), PipelineError> {
    match format {
        ExportFormat::Json => write_json(out, report),
        ExportFormat::Csv => write_trends(out, &report.trends, format),
    }
}

/// Create `path` (truncating) and fill it with `write`.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be created, otherwise
/// whatever `write` returns.
pub fn export_to_file<F>(path: &Path, write: F) -> Result<PathBuf, PipelineError>
where
    F: FnOnce(&mut std::io::BufWriter<std::fs::File>) -> Result<(), PipelineError>,
{
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    write(&mut out)?;
    out.flush()?;
    tracing::info!(path = %path.display(), "export written");
    Ok(path.to_path_buf())
}

fn write_json<W, T>(out: &mut W, value: &T) -> Result<(), PipelineError>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn write_csv_record<W, I>(out: &mut W, fields: I) -> Result<(), PipelineError>
where
    W: Write + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let line = fields
        .into_iter()
        .map(|field| csv_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")?;
    Ok(())
}

/// Quote a field when it holds a delimiter, quote or line break; embedded
/// quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn trend(id: i64, text: &str) -> TrendRow {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        TrendRow {
            id,
            processed_post_id: id * 10,
            pipeline_run_id: Some(1),
            anomaly_score: 0.75,
            is_viral: true,
            detected_at: at,
            platform: "twitter".to_string(),
            original_text: text.to_string(),
            normalized_text: String::new(),
            created_at: at,
            likes: 900,
            retweets: 400,
            score: 0,
            num_comments: 0,
            engagement_score: 1700.0,
            sentiment_label: "positive".to_string(),
            sentiment_score: 0.5,
        }
    }

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(" csv ".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn default_filename_uses_timestamp_and_extension() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            default_report_filename(now, ExportFormat::Csv),
            "trend_report_20260304_050607.csv"
        );
        assert_eq!(
            default_report_filename(now, ExportFormat::Json),
            "trend_report_20260304_050607.json"
        );
    }

    #[test]
    fn csv_fields_are_quoted_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn trend_csv_has_header_and_one_row_per_trend() {
        let mut out = Vec::new();
        write_trends(
            &mut out,
            &[trend(1, "Big, news"), trend(2, "quiet")],
            ExportFormat::Csv,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,processed_post_id,platform,original_text"));
        assert!(lines[1].starts_with("1,10,twitter,\"Big, news\","));
        assert!(lines[2].starts_with("2,20,twitter,quiet,"));
    }

    #[test]
    fn empty_trend_csv_is_header_only() {
        let mut out = Vec::new();
        write_trends(&mut out, &[], ExportFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().matches("\r\n").count(), 1);
    }

    #[test]
    fn report_json_has_summary_and_sections() {
        let report = TrendReport {
            generated_at: Utc::now(),
            summary: ReportSummary {
                total_posts: 12,
                total_topics: 0,
                anomalies_detected: 1,
            },
            trends: vec![trend(1, "hello")],
            topics: Vec::new(),
        };
        let mut out = Vec::new();
        write_report(&mut out, &report, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["summary"]["total_posts"], 12);
        assert_eq!(value["summary"]["anomalies_detected"], 1);
        assert_eq!(value["trends"][0]["original_text"], "hello");
        assert!(value["topics"].as_array().unwrap().is_empty());
        assert!(value["generated_at"].is_string());
    }
}
