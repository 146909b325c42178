use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Symmetric label threshold applied to sentiment polarity.
    pub sentiment_threshold: f64,
    pub topic_count: usize,
    pub topic_passes: usize,
    pub topic_top_words: usize,
    pub anomaly_contamination: f64,
    /// Seed shared by the topic model and the anomaly model.
    pub random_seed: u64,
    /// Cron expression for scheduled pipeline runs in the server. `None` disables the job.
    pub pipeline_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("sentiment_threshold", &self.sentiment_threshold)
            .field("topic_count", &self.topic_count)
            .field("topic_passes", &self.topic_passes)
            .field("topic_top_words", &self.topic_top_words)
            .field("anomaly_contamination", &self.anomaly_contamination)
            .field("random_seed", &self.random_seed)
            .field("pipeline_cron", &self.pipeline_cron)
            .finish()
    }
}
