//! Trend-detection pipeline: ingestion, processing, topic modelling,
//! anomaly detection and export over the `trendwatch-db` store.

pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod orchestrator;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use export::{
    build_report, default_report_filename, export_to_file, write_posts, write_report,
    write_trends, ExportFormat, ReportSummary, TrendReport,
};
pub use ingest::{
    generate_mock_posts, ingest_file, load_posts_file, parse_posts_json, seed_mock_posts,
    DEFAULT_MOCK_COUNT,
};
pub use orchestrator::{
    build_processed_post, detect_trends, process_pending, run_detection, run_pipeline,
    train_topics, PipelineReport,
};
