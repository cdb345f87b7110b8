//! In-memory bucket implementation for tests and offline experimentation.
//!
//! Mirrors the semantics the reconciler relies on from the real store:
//! per-key revisions drawn from a monotonically increasing counter,
//! create-only `put`, revision-checked `update`, and hard-deleting `purge`.
//! Every operation is counted so tests can assert write-avoidance.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::KvError;
use crate::kv::{KvBucket, KvEntry, KvStore};

/// How many times each bucket operation has been invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_keys: u64,
    pub get: u64,
    pub put: u64,
    pub update: u64,
    pub purge: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, (Vec<u8>, u64)>,
    next_revision: u64,
    calls: CallCounts,
}

impl Inner {
    fn bump_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}

/// An in-process [`KvBucket`] backed by a mutex-guarded map.
///
/// Cloning yields another handle to the same bucket, which lets tests play
/// the part of a concurrent writer.
#[derive(Debug, Clone, Default)]
pub struct MemoryBucket {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing call counting. Returns the revision.
    pub fn seed(&self, key: &str, value: impl Into<Vec<u8>>) -> u64 {
        let mut inner = self.lock();
        let revision = inner.bump_revision();
        inner.entries.insert(key.to_string(), (value.into(), revision));
        revision
    }

    /// Current revision of a key, if present.
    pub fn revision_of(&self, key: &str) -> Option<u64> {
        self.lock().entries.get(key).map(|(_, rev)| *rev)
    }

    /// Snapshot of the bucket contents, sorted by key, for assertions.
    pub fn dump(&self) -> BTreeMap<String, Vec<u8>> {
        self.lock()
            .entries
            .iter()
            .map(|(k, (v, _))| (k.clone(), v.clone()))
            .collect()
    }

    /// Operation counters accumulated so far.
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("bucket mutex poisoned")
    }
}

#[async_trait]
impl KvBucket for MemoryBucket {
    async fn list_keys(&self) -> Result<Vec<String>, KvError> {
        let mut inner = self.lock();
        inner.calls.list_keys += 1;
        Ok(inner.entries.keys().cloned().collect())
    }

    async fn get(&self, key: &str) -> Result<KvEntry, KvError> {
        let mut inner = self.lock();
        inner.calls.get += 1;
        match inner.entries.get(key) {
            Some((value, revision)) => Ok(KvEntry {
                value: value.clone(),
                revision: *revision,
            }),
            None => Err(KvError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<u64, KvError> {
        let mut inner = self.lock();
        inner.calls.put += 1;
        if inner.entries.contains_key(key) {
            return Err(KvError::AlreadyExists {
                key: key.to_string(),
            });
        }
        let revision = inner.bump_revision();
        inner
            .entries
            .insert(key.to_string(), (value.to_vec(), revision));
        Ok(revision)
    }

    async fn update(
        &self,
        key: &str,
        value: &[u8],
        expected_revision: u64,
    ) -> Result<u64, KvError> {
        let mut inner = self.lock();
        inner.calls.update += 1;
        let current = match inner.entries.get(key) {
            Some((_, revision)) => *revision,
            None => {
                return Err(KvError::NotFound {
                    key: key.to_string(),
                })
            }
        };
        if current != expected_revision {
            return Err(KvError::RevisionConflict {
                key: key.to_string(),
                expected: expected_revision,
            });
        }
        let revision = inner.bump_revision();
        inner
            .entries
            .insert(key.to_string(), (value.to_vec(), revision));
        Ok(revision)
    }

    async fn purge(&self, key: &str) -> Result<(), KvError> {
        let mut inner = self.lock();
        inner.calls.purge += 1;
        match inner.entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(KvError::NotFound {
                key: key.to_string(),
            }),
        }
    }
}

/// An in-process [`KvStore`] holding named [`MemoryBucket`]s.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, MemoryBucket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn ensure_bucket(
        &self,
        name: &str,
        _history: usize,
    ) -> Result<Box<dyn KvBucket>, KvError> {
        let mut buckets = self.buckets.lock().expect("store mutex poisoned");
        let bucket = buckets.entry(name.to_string()).or_default().clone();
        Ok(Box::new(bucket))
    }
}
