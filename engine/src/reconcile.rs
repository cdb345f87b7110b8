//! Reconciliation: make a versioned KV bucket match a desired mapping.
//!
//! # Algorithm
//!
//! 1. Snapshot the bucket's key set with a single `list_keys` call
//! 2. Classify every remote key as foreign, orphan, or matched; matched
//!    keys are read and scheduled for update only when the stored value
//!    differs byte-for-byte from the desired one
//! 3. Desired keys with no matched remote key become additions
//! 4. Apply removals first, then updates, then additions; updates are
//!    guarded by the revision observed in step 2
//!
//! The snapshot is taken once and never refreshed within a pass. Staleness
//! is resolved by the per-key revision check at write time, not by
//! re-listing: a conflicted update is reported and skipped, and the next
//! scheduled pass converges from the then-current remote state. There is no
//! distributed lock; the store's revision check is the only mutual
//! exclusion relied upon.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{DecimalKeyCodec, KeyCodec};
use crate::desired::DesiredSet;
use crate::error::KvError;
use crate::kv::KvBucket;
use crate::plan::{PlannedAdd, PlannedRemoval, PlannedUpdate, ReconcilePlan, RemovalReason};
use crate::StoreId;

/// Which planned operation a per-key failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlannedAction {
    Update,
    Remove,
    Add,
}

/// A per-key failure that did not abort the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFailure {
    pub key: String,
    pub action: PlannedAction,
    pub error: String,
}

/// Outcome of one reconciliation pass: the action taken per key.
///
/// This report is the only contract surface toward callers and monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Matched keys rewritten because their remote value differed
    pub updated: Vec<StoreId>,
    /// Desired keys created in the bucket
    pub added: Vec<StoreId>,
    /// Foreign and orphaned remote keys purged (or already gone)
    pub removed: Vec<String>,
    /// Matched keys whose remote value already matched; no write issued
    pub unchanged: Vec<StoreId>,
    /// Updates skipped because another writer won the revision race
    pub conflicts: Vec<StoreId>,
    /// Additions skipped because the key appeared after the snapshot
    pub skipped_adds: Vec<StoreId>,
    /// Per-key failures that did not abort the pass
    pub failures: Vec<KeyFailure>,
}

impl ReconcileReport {
    /// Whether the pass completed with no conflicts and no failures.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.failures.is_empty()
    }

    /// Number of mutations actually committed.
    pub fn mutation_count(&self) -> usize {
        self.updated.len() + self.added.len() + self.removed.len()
    }
}

/// A pass stopped partway through apply; `partial` holds what completed.
///
/// Raised only for transport-level errors. Re-invoking a whole pass is safe:
/// the algorithm is idempotent given an unchanged desired set and remote
/// state.
#[derive(Debug, Clone, Error)]
#[error("reconciliation pass aborted: {source}")]
pub struct PassAborted {
    #[source]
    pub source: KvError,
    pub partial: ReconcileReport,
}

/// Diffs a desired mapping against a bucket and applies the minimal,
/// revision-guarded set of changes.
pub struct Reconciler<C = DecimalKeyCodec> {
    codec: C,
}

impl Reconciler<DecimalKeyCodec> {
    /// Create a reconciler with the canonical decimal key codec.
    pub fn new() -> Self {
        Self {
            codec: DecimalKeyCodec,
        }
    }
}

impl Default for Reconciler<DecimalKeyCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: KeyCodec> Reconciler<C> {
    /// Create a reconciler with a custom key codec.
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Compute the plan for one pass without applying it.
    ///
    /// Issues one `list_keys` plus one `get` per matched key. Any transport
    /// error aborts planning; nothing has been mutated at that point.
    pub async fn plan(
        &self,
        desired: &DesiredSet,
        bucket: &dyn KvBucket,
    ) -> Result<ReconcilePlan, KvError> {
        let snapshot = bucket.list_keys().await?;

        let mut plan = ReconcilePlan::default();
        let mut matched = BTreeSet::new();

        for key in snapshot {
            let id = match self.codec.decode(&key) {
                Some(id) => id,
                None => {
                    plan.removals.push(PlannedRemoval {
                        key,
                        reason: RemovalReason::Foreign,
                    });
                    continue;
                }
            };

            let want = match desired.get(id) {
                Some(want) => want,
                None => {
                    plan.removals.push(PlannedRemoval {
                        key,
                        reason: RemovalReason::Orphan,
                    });
                    continue;
                }
            };

            match bucket.get(&key).await {
                Ok(entry) => {
                    matched.insert(id);
                    if entry.value != want {
                        plan.updates.push(PlannedUpdate {
                            id,
                            key,
                            value: want.to_vec(),
                            expected_revision: entry.revision,
                        });
                    } else {
                        plan.unchanged.push(id);
                    }
                }
                // Listed but gone by the time we read it; leaving it out of
                // the matched set lets the addition step re-create it.
                Err(KvError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        for (id, value) in desired.iter() {
            if !matched.contains(&id) {
                plan.additions.push(PlannedAdd {
                    id,
                    key: self.codec.encode(id),
                    value: value.to_vec(),
                });
            }
        }

        Ok(plan)
    }

    /// Apply a computed plan, collecting per-key outcomes into a report.
    ///
    /// Removals go first so a key never transiently exists with two reasons
    /// to exist; updates and additions touch disjoint keys by construction.
    /// Only a transport error stops the pass.
    pub async fn apply(
        &self,
        plan: ReconcilePlan,
        bucket: &dyn KvBucket,
    ) -> Result<ReconcileReport, PassAborted> {
        let mut report = ReconcileReport {
            unchanged: plan.unchanged,
            ..Default::default()
        };

        for removal in plan.removals {
            match bucket.purge(&removal.key).await {
                Ok(()) => report.removed.push(removal.key),
                // Already gone: converged
                Err(KvError::NotFound { .. }) => report.removed.push(removal.key),
                Err(err) if err.is_fatal() => {
                    return Err(PassAborted {
                        source: err,
                        partial: report,
                    })
                }
                Err(err) => report.failures.push(KeyFailure {
                    key: removal.key,
                    action: PlannedAction::Remove,
                    error: err.to_string(),
                }),
            }
        }

        for update in plan.updates {
            match bucket
                .update(&update.key, &update.value, update.expected_revision)
                .await
            {
                Ok(_) => report.updated.push(update.id),
                // Another writer committed since the snapshot. Not retried
                // within this pass; the next pass re-evaluates.
                Err(KvError::RevisionConflict { .. }) => report.conflicts.push(update.id),
                // The key vanished between snapshot and apply; same race,
                // same answer.
                Err(KvError::NotFound { .. }) => report.conflicts.push(update.id),
                Err(err) if err.is_fatal() => {
                    return Err(PassAborted {
                        source: err,
                        partial: report,
                    })
                }
                Err(err) => report.failures.push(KeyFailure {
                    key: update.key,
                    action: PlannedAction::Update,
                    error: err.to_string(),
                }),
            }
        }

        for add in plan.additions {
            // A concurrent pass may have created the key after our snapshot;
            // re-check before putting and treat presence as already synced.
            match bucket.get(&add.key).await {
                Ok(_) => {
                    report.skipped_adds.push(add.id);
                    continue;
                }
                Err(KvError::NotFound { .. }) => {}
                Err(err) if err.is_fatal() => {
                    return Err(PassAborted {
                        source: err,
                        partial: report,
                    })
                }
                Err(err) => {
                    report.failures.push(KeyFailure {
                        key: add.key,
                        action: PlannedAction::Add,
                        error: err.to_string(),
                    });
                    continue;
                }
            }

            match bucket.put(&add.key, &add.value).await {
                Ok(_) => report.added.push(add.id),
                Err(KvError::AlreadyExists { .. }) => report.skipped_adds.push(add.id),
                Err(err) if err.is_fatal() => {
                    return Err(PassAborted {
                        source: err,
                        partial: report,
                    })
                }
                Err(err) => report.failures.push(KeyFailure {
                    key: add.key,
                    action: PlannedAction::Add,
                    error: err.to_string(),
                }),
            }
        }

        Ok(report)
    }

    /// Run one full pass: snapshot, classify, apply.
    pub async fn reconcile(
        &self,
        desired: &DesiredSet,
        bucket: &dyn KvBucket,
    ) -> Result<ReconcileReport, PassAborted> {
        let plan = self.plan(desired, bucket).await.map_err(|source| PassAborted {
            source,
            partial: ReconcileReport::default(),
        })?;
        self.apply(plan, bucket).await
    }
}
