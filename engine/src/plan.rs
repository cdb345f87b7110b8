//! The reconciliation plan: what one pass intends to change.
//!
//! A plan is derived from the snapshot and the desired set, applied once,
//! and discarded. It is never persisted.

use serde::{Deserialize, Serialize};

use crate::StoreId;

/// Why a remote key is scheduled for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalReason {
    /// The key does not decode as a store id at all.
    Foreign,
    /// The key decodes, but no desired entry exists for it this pass.
    Orphan,
}

/// A matched key whose remote value differs from the desired value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedUpdate {
    pub id: StoreId,
    pub key: String,
    pub value: Vec<u8>,
    /// Revision observed during the snapshot read; the write is conditioned
    /// on it still being current.
    pub expected_revision: u64,
}

/// A foreign or orphaned remote key to purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRemoval {
    pub key: String,
    pub reason: RemovalReason,
}

/// A desired entry with no matched remote key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAdd {
    pub id: StoreId,
    pub key: String,
    pub value: Vec<u8>,
}

/// Everything one pass intends to do, as three disjoint operation lists.
///
/// A key appears in at most one list: a remote key cannot be both matched
/// and scheduled for removal within the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    pub updates: Vec<PlannedUpdate>,
    pub removals: Vec<PlannedRemoval>,
    pub additions: Vec<PlannedAdd>,
    /// Matched keys whose remote value already equals the desired value;
    /// no write will be issued for these.
    pub unchanged: Vec<StoreId>,
}

impl ReconcilePlan {
    /// Whether applying this plan would touch the bucket at all.
    pub fn is_noop(&self) -> bool {
        self.mutation_count() == 0
    }

    /// Number of mutating operations the plan contains.
    pub fn mutation_count(&self) -> usize {
        self.updates.len() + self.removals.len() + self.additions.len()
    }
}
