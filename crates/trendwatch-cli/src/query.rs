//! Read-only trend, post and sentiment query handlers.

use clap::Subcommand;
use trendwatch_core::{Platform, SentimentLabel};
use trendwatch_analysis::SentimentSummary;
use trendwatch_db::{PostListFilters, SentimentBreakdownRow, TrendListFilters};

/// Sub-commands available under `trends`.
#[derive(Debug, Subcommand)]
pub enum TrendsCommands {
    /// List current trends, most anomalous first
    List {
        /// Maximum number of trends to show (1-200)
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(i64).range(1..=200))]
        limit: i64,
        /// Filter by platform (e.g., twitter)
        #[arg(long)]
        platform: Option<String>,
        /// Filter by sentiment label
        #[arg(long)]
        sentiment: Option<SentimentLabel>,
    },
}

/// Sub-commands available under `posts`.
#[derive(Debug, Subcommand)]
pub enum PostsCommands {
    /// List processed posts, highest engagement first
    List {
        /// Maximum number of posts to show (1-200)
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(i64).range(1..=200))]
        limit: i64,
        /// Filter by platform (e.g., reddit)
        #[arg(long)]
        platform: Option<String>,
        /// Filter by sentiment label
        #[arg(long)]
        sentiment: Option<SentimentLabel>,
    },
}

/// Sub-commands available under `sentiment`.
#[derive(Debug, Subcommand)]
pub enum SentimentCommands {
    /// Show the label distribution and average polarity
    Stats,
}

/// Shorten `text` to at most `max` characters for table display.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

pub(crate) async fn run_trends_list(
    pool: &sqlx::PgPool,
    limit: i64,
    platform: Option<&str>,
    sentiment: Option<SentimentLabel>,
) -> anyhow::Result<()> {
    let platform = platform.map(|p| Platform::from(p).to_string());
    let (trends, total) = trendwatch_db::list_trends_page(
        pool,
        TrendListFilters {
            platform: platform.as_deref(),
            sentiment: sentiment.map(SentimentLabel::as_str),
            limit: Some(limit),
            offset: 0,
        },
    )
    .await?;

    if trends.is_empty() {
        println!("no trends found; run `pipeline run` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<10}{:<10}{:<12}{:<10}TEXT",
        "POST", "PLATFORM", "ANOMALY", "ENGAGEMENT", "SENTIMENT"
    );
    for t in &trends {
        println!(
            "{:<8}{:<10}{:<10.4}{:<12.1}{:<10}{}",
            t.processed_post_id,
            t.platform,
            t.anomaly_score,
            t.engagement_score,
            t.sentiment_label,
            truncate(&t.original_text, 60)
        );
    }
    println!("showing {} of {total} trend(s)", trends.len());
    Ok(())
}

pub(crate) async fn run_posts_list(
    pool: &sqlx::PgPool,
    limit: i64,
    platform: Option<&str>,
    sentiment: Option<SentimentLabel>,
) -> anyhow::Result<()> {
    let platform = platform.map(|p| Platform::from(p).to_string());
    let (posts, total) = trendwatch_db::list_posts_page(
        pool,
        PostListFilters {
            platform: platform.as_deref(),
            sentiment: sentiment.map(SentimentLabel::as_str),
            limit: Some(limit),
            offset: 0,
        },
    )
    .await?;

    if posts.is_empty() {
        println!("no processed posts found; run `pipeline process` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<10}{:<12}{:<10}{:<8}TEXT",
        "ID", "PLATFORM", "ENGAGEMENT", "SENTIMENT", "SCORE"
    );
    for p in &posts {
        println!(
            "{:<8}{:<10}{:<12.1}{:<10}{:<8.3}{}",
            p.id,
            p.platform,
            p.engagement_score,
            p.sentiment_label,
            p.sentiment_score,
            truncate(&p.original_text, 60)
        );
    }
    println!("showing {} of {total} post(s)", posts.len());
    Ok(())
}

pub(crate) async fn run_sentiment_stats(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let rows = trendwatch_db::sentiment_breakdown(pool).await?;
    let Some(summary) =
        SentimentSummary::from_groups(rows.iter().filter_map(SentimentBreakdownRow::as_group))
    else {
        println!("no processed posts; run `pipeline process` first");
        return Ok(());
    };

    println!("{:<10}{:<8}AVG", "LABEL", "POSTS");
    for label in SentimentLabel::ALL {
        let avg = rows
            .iter()
            .find(|r| r.sentiment_label == label.as_str())
            .map_or(0.0, |r| r.avg_score);
        let count = match label {
            SentimentLabel::Positive => summary.distribution.positive,
            SentimentLabel::Negative => summary.distribution.negative,
            SentimentLabel::Neutral => summary.distribution.neutral,
        };
        println!("{:<10}{count:<8}{avg:.3}", label.as_str());
    }
    println!("total analyzed: {}", summary.total_analyzed);
    println!("average sentiment: {:.3}", summary.average_sentiment);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdefghij", 5), "abcd\u{2026}");
    }
}
