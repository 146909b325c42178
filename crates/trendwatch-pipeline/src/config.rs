use trendwatch_analysis::{AnomalyConfig, SentimentThresholds, TopicConfig};
use trendwatch_core::AppConfig;

/// Parameters for every analysis stage of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub thresholds: SentimentThresholds,
    pub topics: TopicConfig,
    pub anomaly: AnomalyConfig,
}

impl PipelineConfig {
    /// Stage parameters from application config. Model sizes not exposed as
    /// settings keep their defaults.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            thresholds: SentimentThresholds::symmetric(config.sentiment_threshold),
            topics: TopicConfig {
                num_topics: config.topic_count,
                passes: config.topic_passes,
                top_words: config.topic_top_words,
                seed: config.random_seed,
                ..TopicConfig::default()
            },
            anomaly: AnomalyConfig {
                contamination: config.anomaly_contamination,
                seed: config.random_seed,
                ..AnomalyConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use trendwatch_core::Environment;

    use super::*;

    #[test]
    fn from_app_config_maps_every_setting() {
        let app = AppConfig {
            database_url: "postgres://example".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            log_level: "info".to_string(),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            sentiment_threshold: 0.2,
            topic_count: 4,
            topic_passes: 8,
            topic_top_words: 6,
            anomaly_contamination: 0.05,
            random_seed: 7,
            pipeline_cron: None,
        };

        let cfg = PipelineConfig::from_app_config(&app);
        assert!((cfg.thresholds.positive - 0.2).abs() < f64::EPSILON);
        assert!((cfg.thresholds.negative + 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.topics.num_topics, 4);
        assert_eq!(cfg.topics.passes, 8);
        assert_eq!(cfg.topics.top_words, 6);
        assert_eq!(cfg.topics.seed, 7);
        assert_eq!(cfg.topics.min_documents, 10);
        assert!((cfg.anomaly.contamination - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.anomaly.seed, 7);
        assert_eq!(cfg.anomaly.num_trees, 100);
        assert_eq!(cfg.anomaly.min_samples, 5);
    }
}
