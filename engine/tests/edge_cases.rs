//! Edge case tests for skysync-engine
//!
//! These tests cover boundary conditions and unusual inputs through the
//! public API only.

use skysync_engine::{
    DesiredSet, KeyCodec, KvBucket, KvStore, MemoryBucket, MemoryStore, Reconciler, StoreId,
};

fn desired(entries: &[(StoreId, &[u8])]) -> DesiredSet {
    entries.iter().map(|(k, v)| (*k, v.to_vec())).collect()
}

// ============================================================================
// Payload Edge Cases
// ============================================================================

#[tokio::test]
async fn large_binary_payload() {
    let bucket = MemoryBucket::new();

    // 1MB of non-UTF8 bytes
    let blob: Vec<u8> = (0..1024 * 1024).map(|i| (i % 251) as u8).collect();
    let mut want = DesiredSet::new();
    want.insert(1, blob.clone());

    let report = Reconciler::new().reconcile(&want, &bucket).await.unwrap();
    assert_eq!(report.added, vec![1]);
    assert_eq!(bucket.dump()["1"], blob);
}

#[tokio::test]
async fn payload_differing_only_in_trailing_byte_is_updated() {
    let bucket = MemoryBucket::new();
    bucket.seed("1", b"payload".to_vec());

    let want = desired(&[(1, b"payloaD")]);
    let report = Reconciler::new().reconcile(&want, &bucket).await.unwrap();
    assert_eq!(report.updated, vec![1]);
}

#[tokio::test]
async fn shrinking_a_payload_to_empty_still_writes() {
    let bucket = MemoryBucket::new();
    bucket.seed("1", b"something".to_vec());

    let want = desired(&[(1, b"")]);
    let report = Reconciler::new().reconcile(&want, &bucket).await.unwrap();

    assert_eq!(report.updated, vec![1]);
    assert_eq!(bucket.dump()["1"], b"");
}

// ============================================================================
// Key Edge Cases
// ============================================================================

#[tokio::test]
async fn unicode_and_whitespace_keys_are_purged_as_foreign() {
    let bucket = MemoryBucket::new();
    bucket.seed("日本", b"x".to_vec());
    bucket.seed(" 1", b"x".to_vec());
    bucket.seed("1 ", b"x".to_vec());
    bucket.seed("", b"x".to_vec());

    let report = Reconciler::new()
        .reconcile(&DesiredSet::new(), &bucket)
        .await
        .unwrap();

    assert_eq!(report.removed.len(), 4);
    assert!(bucket.dump().is_empty());
}

#[tokio::test]
async fn max_store_id_round_trips() {
    let bucket = MemoryBucket::new();
    let mut want = DesiredSet::new();
    want.insert(StoreId::MAX, b"edge".to_vec());

    let reconciler = Reconciler::new();
    let report = reconciler.reconcile(&want, &bucket).await.unwrap();
    assert_eq!(report.added, vec![StoreId::MAX]);

    let second = reconciler.reconcile(&want, &bucket).await.unwrap();
    assert_eq!(second.unchanged, vec![StoreId::MAX]);
}

#[tokio::test]
async fn custom_codec_controls_classification() {
    // Keys carry a "store-" prefix in this bucket.
    struct PrefixedCodec;

    impl KeyCodec for PrefixedCodec {
        fn encode(&self, id: StoreId) -> String {
            format!("store-{id}")
        }
        fn decode(&self, raw: &str) -> Option<StoreId> {
            let digits = raw.strip_prefix("store-")?;
            let id: StoreId = digits.parse().ok()?;
            (id >= 0 && id.to_string() == digits).then_some(id)
        }
    }

    let bucket = MemoryBucket::new();
    bucket.seed("store-1", b"old".to_vec());
    bucket.seed("1", b"bare".to_vec()); // foreign under this codec

    let want = desired(&[(1, b"new"), (2, b"fresh")]);
    let report = Reconciler::with_codec(PrefixedCodec)
        .reconcile(&want, &bucket)
        .await
        .unwrap();

    assert_eq!(report.updated, vec![1]);
    assert_eq!(report.added, vec![2]);
    assert_eq!(report.removed, vec!["1".to_string()]);

    let state = bucket.dump();
    assert_eq!(state["store-1"], b"new");
    assert_eq!(state["store-2"], b"fresh");
}

// ============================================================================
// Concurrency Edge Cases
// ============================================================================

#[tokio::test]
async fn conflict_on_one_key_leaves_the_rest_converged() {
    let bucket = MemoryBucket::new();
    bucket.seed("1", b"stale".to_vec());
    bucket.seed("2", b"stale".to_vec());
    bucket.seed("3", b"stale".to_vec());
    bucket.seed("oops", b"junk".to_vec());

    let want = desired(&[(1, b"a"), (2, b"b"), (3, b"c"), (4, b"d")]);
    let reconciler = Reconciler::new();
    let plan = reconciler.plan(&want, &bucket).await.unwrap();

    // Concurrent writer bumps key 2 after the snapshot.
    let revision = bucket.revision_of("2").unwrap();
    bucket.update("2", b"concurrent", revision).await.unwrap();

    let report = reconciler.apply(plan, &bucket).await.unwrap();

    assert_eq!(report.conflicts, vec![2]);
    assert_eq!(report.updated, vec![1, 3]);
    assert_eq!(report.added, vec![4]);
    assert_eq!(report.removed, vec!["oops".to_string()]);

    let state = bucket.dump();
    assert_eq!(state["1"], b"a");
    assert_eq!(state["2"], b"concurrent"); // the winner is untouched
    assert_eq!(state["3"], b"c");
    assert_eq!(state["4"], b"d");
}

#[tokio::test]
async fn two_overlapping_passes_both_complete() {
    // Both passes plan the same addition from an empty snapshot; the
    // defensive re-check makes the loser skip instead of fail.
    let bucket = MemoryBucket::new();
    let want = desired(&[(10, b"v")]);
    let reconciler = Reconciler::new();

    let plan_a = reconciler.plan(&want, &bucket).await.unwrap();
    let plan_b = reconciler.plan(&want, &bucket).await.unwrap();

    let report_a = reconciler.apply(plan_a, &bucket).await.unwrap();
    let report_b = reconciler.apply(plan_b, &bucket).await.unwrap();

    assert_eq!(report_a.added, vec![10]);
    assert_eq!(report_b.skipped_adds, vec![10]);
    assert!(report_a.is_clean() && report_b.is_clean());
    assert_eq!(bucket.dump()["10"], b"v");
}

// ============================================================================
// Store / Report Surface
// ============================================================================

#[tokio::test]
async fn ensure_bucket_is_idempotent() {
    let store = MemoryStore::new();
    let bucket = store.ensure_bucket("weather", 1).await.unwrap();
    bucket.put("1", b"a").await.unwrap();

    let reopened = store.ensure_bucket("weather", 1).await.unwrap();
    assert_eq!(reopened.get("1").await.unwrap().value, b"a");
}

#[tokio::test]
async fn report_serializes_for_monitoring() {
    let bucket = MemoryBucket::new();
    bucket.seed("9", b"orphan".to_vec());

    let want = desired(&[(1, b"a")]);
    let report = Reconciler::new().reconcile(&want, &bucket).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["added"], serde_json::json!([1]));
    assert_eq!(json["removed"], serde_json::json!(["9"]));
    assert_eq!(json["skippedAdds"], serde_json::json!([]));
}
