//! # Skysync Engine
//!
//! A reconciliation engine that makes a remote versioned key-value bucket
//! match a desired mapping exactly, using the minimum number of writes and
//! without discarding concurrent modifications made by other writers.
//!
//! ## Design Principles
//!
//! - **No IO**: all remote access goes through the injected [`KvBucket`] trait
//! - **Minimal writes**: a key is only written when its stored value differs
//! - **Optimistic concurrency**: updates are guarded by the revision observed
//!   during the snapshot read; a conflicting writer is never overwritten
//! - **Partial-failure tolerant**: one key's failure does not abort the pass
//!
//! ## Core Concepts
//!
//! ### Desired set
//!
//! The target state for one pass: a mapping from integer store ids to opaque
//! byte payloads, built fresh each pass by the caller ([`DesiredSet`]).
//!
//! ### Classification
//!
//! Every remote key is classified against the desired set:
//! - *foreign* - does not decode as a store id; scheduled for removal
//! - *orphan* - decodes, but no desired entry exists; scheduled for removal
//! - *matched* - has a desired entry; updated only if the values differ
//!
//! ### Plan and report
//!
//! A pass first computes an ephemeral [`ReconcilePlan`] (updates, removals,
//! additions), then applies it and returns a [`ReconcileReport`] describing
//! what happened to each key. Revision conflicts are reported, not retried;
//! the next scheduled pass re-evaluates from the then-current remote state.
//!
//! ## Quick Start
//!
//! ```rust
//! use skysync_engine::{DesiredSet, MemoryBucket, Reconciler};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let bucket = MemoryBucket::new();
//! bucket.seed("1", b"stale".to_vec());
//! bucket.seed("not-a-store", b"junk".to_vec());
//!
//! let mut desired = DesiredSet::new();
//! desired.insert(1, b"fresh".to_vec());
//! desired.insert(2, b"new".to_vec());
//!
//! let report = Reconciler::new().reconcile(&desired, &bucket).await.unwrap();
//! assert_eq!(report.updated, vec![1]);
//! assert_eq!(report.added, vec![2]);
//! assert_eq!(report.removed, vec!["not-a-store".to_string()]);
//! # });
//! ```

pub mod codec;
pub mod desired;
pub mod error;
pub mod kv;
pub mod memory;
pub mod plan;
pub mod reconcile;

// Re-export main types at crate root
pub use codec::{DecimalKeyCodec, KeyCodec};
pub use desired::{DesiredEntry, DesiredSet};
pub use error::KvError;
pub use kv::{KvBucket, KvEntry, KvStore};
pub use memory::{CallCounts, MemoryBucket, MemoryStore};
pub use plan::{PlannedAdd, PlannedRemoval, PlannedUpdate, ReconcilePlan, RemovalReason};
pub use reconcile::{
    KeyFailure, PassAborted, PlannedAction, ReconcileReport, Reconciler,
};

/// Type aliases for clarity
pub type StoreId = i64;
pub type Revision = u64;
