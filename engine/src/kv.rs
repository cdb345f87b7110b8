//! The versioned key-value capability the reconciler is injected with.
//!
//! The engine never talks to a concrete store; it is handed a [`KvBucket`]
//! trait object. The service crate adapts NATS JetStream KV to this trait,
//! and [`crate::MemoryBucket`] provides an in-process implementation.

use async_trait::async_trait;

use crate::error::KvError;

/// A value together with the revision the store assigned on its last write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub value: Vec<u8>,
    pub revision: u64,
}

/// One bucket of a remote versioned key-value store.
///
/// Revisions are per-key and monotonically increasing; they are assigned by
/// the store, never by the caller.
#[async_trait]
pub trait KvBucket: Send + Sync {
    /// Enumerate all keys currently in the bucket. Ordering is unspecified.
    async fn list_keys(&self) -> Result<Vec<String>, KvError>;

    /// Fetch a key's value and current revision.
    ///
    /// Fails with [`KvError::NotFound`] when the key is absent.
    async fn get(&self, key: &str) -> Result<KvEntry, KvError>;

    /// Create a key that must not already exist; returns the new revision.
    ///
    /// Fails with [`KvError::AlreadyExists`] when the key is present.
    async fn put(&self, key: &str, value: &[u8]) -> Result<u64, KvError>;

    /// Write a new value only if the stored revision still matches.
    ///
    /// Fails with [`KvError::RevisionConflict`] when another writer has
    /// committed since `expected_revision` was observed.
    async fn update(
        &self,
        key: &str,
        value: &[u8],
        expected_revision: u64,
    ) -> Result<u64, KvError>;

    /// Permanently remove a key and its history.
    ///
    /// Fails with [`KvError::NotFound`] when already absent; callers treat
    /// that as a benign no-op.
    async fn purge(&self, key: &str) -> Result<(), KvError>;
}

/// A store that can open or create named buckets.
///
/// Used once per pass at setup, not part of the reconciliation loop proper.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Open the bucket if it exists, else create it with the given history
    /// retention depth. Idempotent.
    async fn ensure_bucket(
        &self,
        name: &str,
        history: usize,
    ) -> Result<Box<dyn KvBucket>, KvError>;
}
