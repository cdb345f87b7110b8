//! Error types for the skysync engine.

use thiserror::Error;

/// Errors surfaced by a versioned KV bucket.
///
/// Only [`KvError::Transport`] is fatal to a reconciliation pass; the other
/// variants are handled at key granularity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("key already exists: {key}")]
    AlreadyExists { key: String },

    #[error("revision conflict on {key}: expected revision {expected}")]
    RevisionConflict { key: String, expected: u64 },

    #[error("transport error: {0}")]
    Transport(String),
}

impl KvError {
    /// Whether this error aborts the entire pass rather than one key.
    pub fn is_fatal(&self) -> bool {
        matches!(self, KvError::Transport(_))
    }
}

/// Result type for bucket operations.
pub type Result<T> = std::result::Result<T, KvError>;
