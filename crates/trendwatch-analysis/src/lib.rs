//! Analysis stages of the trend pipeline.
//!
//! Pure, synchronous building blocks: text normalization, engagement and
//! sentiment scoring, LDA topic modeling and isolation-forest anomaly
//! detection. Nothing here touches the store; the pipeline crate feeds rows
//! in and persists what comes out.

pub mod anomaly;
pub mod engagement;
pub mod error;
pub mod lemma;
pub mod normalize;
pub mod scorer;
pub mod stopwords;
pub mod topics;
pub mod types;

pub use anomaly::{detect_anomalies, IsolationForest};
pub use engagement::engagement_score;
pub use error::AnalysisError;
pub use normalize::{normalize, token_count};
pub use scorer::{
    classify, polarity, polarity_scores, sentiment, SentimentDistribution, SentimentScores,
    SentimentSummary,
};
pub use topics::{extract_topics, LdaModel};
pub use types::{
    AnomalyConfig, ModelOutcome, Outlier, SentimentThresholds, Topic, TopicConfig, TopicWord,
};
