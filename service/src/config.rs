//! Configuration management for the service.

use std::env;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// NATS server URL
    pub nats_url: String,
    /// Path to a NATS user credentials file, if authentication is required
    pub nats_creds: Option<String>,
    /// OpenWeatherMap API key
    pub api_key: String,
    /// Name of the KV bucket holding the forecasts
    pub bucket: String,
    /// History retention depth for the bucket; only the latest version per
    /// key needs to be retrievable
    pub history: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let nats_url = env::var("NATS_URL").map_err(|_| ConfigError::Missing("NATS_URL"))?;
        let nats_creds = env::var("NATS_CREDS").ok();
        let api_key = env::var("OPENWEATHER_API_KEY")
            .map_err(|_| ConfigError::Missing("OPENWEATHER_API_KEY"))?;
        let bucket = env::var("KV_BUCKET").unwrap_or_else(|_| "weather".to_string());
        let history = env::var("KV_HISTORY")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidHistory)?;

        Ok(Self {
            database_url,
            nats_url,
            nats_creds,
            api_key,
            bucket,
            history,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid KV_HISTORY value")]
    InvalidHistory,
}
