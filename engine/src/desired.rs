//! The desired key-value mapping one reconciliation pass should make true.
//!
//! A [`DesiredSet`] is built fresh by the producer each pass and discarded
//! afterwards. Values are opaque byte payloads; a zero-length payload is a
//! legal value, not an absence marker.

use std::collections::BTreeMap;

use crate::StoreId;

/// One entry of the desired state: a store id and its serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredEntry {
    pub key: StoreId,
    pub value: Vec<u8>,
}

impl DesiredEntry {
    pub fn new(key: StoreId, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// The full target mapping for one pass, keyed by store id.
///
/// Backed by a `BTreeMap` so iteration order (and therefore the order of
/// planned operations) is deterministic. Duplicate keys are a caller error;
/// the last insert wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredSet {
    entries: BTreeMap<StoreId, Vec<u8>>,
}

impl DesiredSet {
    /// Create an empty desired set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the payload for a store id.
    pub fn insert(&mut self, key: StoreId, value: impl Into<Vec<u8>>) {
        self.entries.insert(key, value.into());
    }

    /// Get the desired payload for a store id.
    pub fn get(&self, key: StoreId) -> Option<&[u8]> {
        self.entries.get(&key).map(Vec::as_slice)
    }

    /// Whether a desired entry exists for this store id.
    pub fn contains(&self, key: StoreId) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of desired entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (StoreId, &[u8])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

impl FromIterator<DesiredEntry> for DesiredSet {
    fn from_iter<I: IntoIterator<Item = DesiredEntry>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry.key, entry.value);
        }
        set
    }
}

impl FromIterator<(StoreId, Vec<u8>)> for DesiredSet {
    fn from_iter<I: IntoIterator<Item = (StoreId, Vec<u8>)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut set = DesiredSet::new();
        set.insert(7, b"payload".to_vec());

        assert!(set.contains(7));
        assert_eq!(set.get(7), Some(&b"payload"[..]));
        assert_eq!(set.get(8), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn collects_from_entries() {
        let set: DesiredSet = vec![
            DesiredEntry::new(2, b"b".to_vec()),
            DesiredEntry::new(1, b"a".to_vec()),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1), Some(&b"a"[..]));
        assert_eq!(set.get(2), Some(&b"b"[..]));
    }

    #[test]
    fn last_insert_wins_on_duplicate_key() {
        let set: DesiredSet = [(1, b"first".to_vec()), (1, b"second".to_vec())]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(1), Some(&b"second"[..]));
    }

    #[test]
    fn empty_payload_is_a_legal_value() {
        let mut set = DesiredSet::new();
        set.insert(1, Vec::new());

        assert!(set.contains(1));
        assert_eq!(set.get(1), Some(&[][..]));
    }

    #[test]
    fn iterates_in_key_order() {
        let set: DesiredSet = [
            (9, b"c".to_vec()),
            (1, b"a".to_vec()),
            (5, b"b".to_vec()),
        ]
        .into_iter()
        .collect();

        let keys: Vec<StoreId> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 5, 9]);
    }
}
