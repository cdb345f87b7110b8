//! Codec between desired-set store ids and the bucket's string keys.
//!
//! The remote store speaks strings; the desired set speaks integers. The
//! codec is injectable so the reconciler never does ad hoc string parsing:
//! a key that fails to decode is classified as foreign and removed.

use crate::StoreId;

/// Translates between [`StoreId`] and the bucket's native string keys.
pub trait KeyCodec: Send + Sync {
    /// Encode a store id into its canonical remote key.
    fn encode(&self, id: StoreId) -> String;

    /// Decode a remote key. `None` marks the key as foreign.
    fn decode(&self, raw: &str) -> Option<StoreId>;
}

/// Canonical base-10 encoding of non-negative store ids.
///
/// Decoding is strict: a key must round-trip back to the same string, so
/// signs, leading zeros, and whitespace all classify as foreign. This keeps
/// the "exactly one remote entry per desired key" invariant safe from
/// aliases like `"007"` and `"7"` coexisting in the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimalKeyCodec;

impl KeyCodec for DecimalKeyCodec {
    fn encode(&self, id: StoreId) -> String {
        id.to_string()
    }

    fn decode(&self, raw: &str) -> Option<StoreId> {
        let id: StoreId = raw.parse().ok()?;
        if id < 0 || id.to_string() != raw {
            return None;
        }
        Some(id)
    }
}
