//! Unified error handling for the service.

use skysync_engine::{KvError, PassAborted};
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("kv store error: {0}")]
    Kv(#[from] KvError),

    #[error(transparent)]
    Aborted(#[from] PassAborted),

    /// Every forecast fetch failed while stores exist. Publishing an empty
    /// desired set here would purge the whole bucket, so the pass refuses
    /// to run instead.
    #[error("no forecasts could be produced; leaving the bucket untouched")]
    NoForecasts,
}
