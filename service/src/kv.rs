//! NATS JetStream key-value adapter.
//!
//! Bridges the engine's [`KvBucket`] capability onto a JetStream KV bucket.
//! JetStream's per-key revision is the stream sequence of the last write,
//! which satisfies the engine's monotonicity requirement.

use async_nats::jetstream::{self, kv};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use skysync_engine::{KvBucket, KvEntry, KvError, KvStore};

fn transport(err: impl std::fmt::Display) -> KvError {
    KvError::Transport(err.to_string())
}

/// A connected NATS JetStream context that can open KV buckets.
pub struct NatsKv {
    jetstream: jetstream::Context,
}

impl NatsKv {
    /// Connect to NATS, optionally authenticating with a user credentials
    /// file.
    pub async fn connect(url: &str, creds: Option<&str>) -> Result<Self, KvError> {
        let client = match creds {
            Some(path) => {
                async_nats::ConnectOptions::with_credentials_file(path)
                    .await
                    .map_err(transport)?
                    .connect(url)
                    .await
                    .map_err(transport)?
            }
            None => async_nats::connect(url).await.map_err(transport)?,
        };

        Ok(Self {
            jetstream: jetstream::new(client),
        })
    }
}

#[async_trait]
impl KvStore for NatsKv {
    async fn ensure_bucket(
        &self,
        name: &str,
        history: usize,
    ) -> Result<Box<dyn KvBucket>, KvError> {
        // Try to open an existing bucket first; create it on failure.
        let store = match self.jetstream.get_key_value(name).await {
            Ok(store) => store,
            Err(_) => self
                .jetstream
                .create_key_value(kv::Config {
                    bucket: name.to_string(),
                    history: history as i64,
                    ..Default::default()
                })
                .await
                .map_err(transport)?,
        };

        Ok(Box::new(NatsBucket { store }))
    }
}

/// One JetStream KV bucket exposed through the engine's capability trait.
pub struct NatsBucket {
    store: kv::Store,
}

#[async_trait]
impl KvBucket for NatsBucket {
    async fn list_keys(&self) -> Result<Vec<String>, KvError> {
        let keys = self.store.keys().await.map_err(transport)?;
        keys.try_collect().await.map_err(transport)
    }

    async fn get(&self, key: &str) -> Result<KvEntry, KvError> {
        let entry = self.store.entry(key).await.map_err(transport)?;
        match entry {
            // Delete/purge markers mean the key is logically absent.
            Some(entry) if entry.operation == kv::Operation::Put => Ok(KvEntry {
                value: entry.value.to_vec(),
                revision: entry.revision,
            }),
            _ => Err(KvError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<u64, KvError> {
        self.store
            .create(key, Bytes::copy_from_slice(value))
            .await
            .map_err(|err| map_create_err(key, err))
    }

    async fn update(
        &self,
        key: &str,
        value: &[u8],
        expected_revision: u64,
    ) -> Result<u64, KvError> {
        self.store
            .update(key, Bytes::copy_from_slice(value), expected_revision)
            .await
            .map_err(|err| map_update_err(key, expected_revision, err))
    }

    async fn purge(&self, key: &str) -> Result<(), KvError> {
        // JetStream purge succeeds for absent keys, so NotFound never
        // surfaces from here.
        self.store.purge(key).await.map_err(transport)
    }
}

fn map_create_err(key: &str, err: kv::CreateError) -> KvError {
    // The typed kind is authoritative; a raced create must never look like
    // a transport failure, or the whole pass would abort on it.
    if err.kind() == kv::CreateErrorKind::AlreadyExists
        || is_create_race_message(&err.to_string())
    {
        KvError::AlreadyExists {
            key: key.to_string(),
        }
    } else {
        transport(err)
    }
}

fn map_update_err(key: &str, expected: u64, err: kv::UpdateError) -> KvError {
    if is_cas_failure_message(&err.to_string()) {
        KvError::RevisionConflict {
            key: key.to_string(),
            expected,
        }
    } else {
        transport(err)
    }
}

// JetStream rejects a CAS miss with API error 10071, "wrong last sequence".
// The update error has no dedicated kind for it, so the embedded API code
// is checked first and the message text kept as a fallback.
fn is_cas_failure_message(message: &str) -> bool {
    message.contains("10071") || message.contains("wrong last sequence")
}

// create is implemented as an update against revision 0, so a raced create
// can also surface as a sequence mismatch rather than a typed AlreadyExists
fn is_create_race_message(message: &str) -> bool {
    message.contains("already exists") || is_cas_failure_message(message)
}
