use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Does not load `.env`; for callers that already did (the CLI) or manage the
/// environment themselves.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation only; tests drive it with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("TRENDWATCH_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(&or_default("TRENDWATCH_BIND_ADDR", "0.0.0.0:3000"))
        .map_err(|e| invalid("TRENDWATCH_BIND_ADDR", e))?;
    let log_level = or_default("TRENDWATCH_LOG_LEVEL", "info");

    let db_max_connections: u32 = parse_as(&or_default("TRENDWATCH_DB_MAX_CONNECTIONS", "10"))
        .map_err(|e| invalid("TRENDWATCH_DB_MAX_CONNECTIONS", e))?;
    let db_min_connections: u32 = parse_as(&or_default("TRENDWATCH_DB_MIN_CONNECTIONS", "1"))
        .map_err(|e| invalid("TRENDWATCH_DB_MIN_CONNECTIONS", e))?;
    let db_acquire_timeout_secs: u64 =
        parse_as(&or_default("TRENDWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10"))
            .map_err(|e| invalid("TRENDWATCH_DB_ACQUIRE_TIMEOUT_SECS", e))?;

    if db_min_connections > db_max_connections {
        return Err(invalid(
            "TRENDWATCH_DB_MIN_CONNECTIONS",
            format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        ));
    }

    let sentiment_threshold: f64 =
        parse_as(&or_default("TRENDWATCH_SENTIMENT_THRESHOLD", "0.05"))
            .map_err(|e| invalid("TRENDWATCH_SENTIMENT_THRESHOLD", e))?;
    if !(sentiment_threshold > 0.0 && sentiment_threshold < 1.0) {
        return Err(invalid(
            "TRENDWATCH_SENTIMENT_THRESHOLD",
            format!("{sentiment_threshold} is outside (0, 1)"),
        ));
    }

    let topic_count: usize = parse_as(&or_default("TRENDWATCH_TOPIC_COUNT", "3"))
        .map_err(|e| invalid("TRENDWATCH_TOPIC_COUNT", e))?;
    if topic_count == 0 {
        return Err(invalid("TRENDWATCH_TOPIC_COUNT", "must be at least 1".into()));
    }
    let topic_passes: usize = parse_as(&or_default("TRENDWATCH_TOPIC_PASSES", "5"))
        .map_err(|e| invalid("TRENDWATCH_TOPIC_PASSES", e))?;
    if topic_passes == 0 {
        return Err(invalid("TRENDWATCH_TOPIC_PASSES", "must be at least 1".into()));
    }
    let topic_top_words: usize = parse_as(&or_default("TRENDWATCH_TOPIC_TOP_WORDS", "5"))
        .map_err(|e| invalid("TRENDWATCH_TOPIC_TOP_WORDS", e))?;

    let anomaly_contamination: f64 =
        parse_as(&or_default("TRENDWATCH_ANOMALY_CONTAMINATION", "0.1"))
            .map_err(|e| invalid("TRENDWATCH_ANOMALY_CONTAMINATION", e))?;
    if !(anomaly_contamination > 0.0 && anomaly_contamination <= 0.5) {
        return Err(invalid(
            "TRENDWATCH_ANOMALY_CONTAMINATION",
            format!("{anomaly_contamination} is outside (0, 0.5]"),
        ));
    }

    let random_seed: u64 = parse_as(&or_default("TRENDWATCH_RANDOM_SEED", "42"))
        .map_err(|e| invalid("TRENDWATCH_RANDOM_SEED", e))?;

    let pipeline_cron = lookup("TRENDWATCH_PIPELINE_CRON")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        sentiment_threshold,
        topic_count,
        topic_passes,
        topic_top_words,
        anomaly_contamination,
        random_seed,
        pipeline_cron,
    })
}

/// Parse a trimmed env value into any `FromStr` type, stringifying the error.
fn parse_as<T>(raw: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| e.to_string())
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
