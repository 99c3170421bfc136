//! Ordered index implementation.
//!
//! An ordered index keeps the keys of one rotation of (S, P, O) in a sorted
//! set. It holds ids only: visibility is decided by the primary index.
//!
//! This enables:
//! - Prefix scan: iterate all keys starting with 0-3 bound ids
//! - Resumable scans: continue strictly after the last key returned, so a
//!   cursor never needs to hold a lock between steps

use std::collections::BTreeSet;
use std::ops::Bound;

use crate::storage::indexes::{EncodedTriple, IndexKey, IndexOrder};
use crate::types::TermId;

/// Sorted key set for one index order.
#[derive(Debug)]
pub struct OrderedIndex {
    order: IndexOrder,
    keys: BTreeSet<IndexKey>,
}

impl OrderedIndex {
    /// Create an empty index for an order.
    #[must_use]
    pub const fn new(order: IndexOrder) -> Self {
        Self {
            order,
            keys: BTreeSet::new(),
        }
    }

    /// Insert a triple's key. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: &EncodedTriple) -> bool {
        self.keys.insert(self.order.key(triple))
    }

    /// Remove a triple's key completely (for garbage collection).
    pub fn remove(&mut self, triple: &EncodedTriple) -> bool {
        self.keys.remove(&self.order.key(triple))
    }

    /// Check if a triple's key is present.
    #[must_use]
    pub fn contains(&self, triple: &EncodedTriple) -> bool {
        self.keys.contains(&self.order.key(triple))
    }

    /// Count all keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the index holds no key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Scan keys starting with `prefix`, strictly after `after` if given.
    ///
    /// Returns at most `limit` keys in ascending order.
    #[must_use]
    pub fn scan(&self, prefix: &[TermId], after: Option<&IndexKey>, limit: usize) -> Vec<IndexKey> {
        debug_assert!(prefix.len() <= 3, "prefix longer than a key");

        let lower = after.map_or_else(
            || Bound::Included(pad_key(prefix, TermId::MIN)),
            |key| Bound::Excluded(*key),
        );
        let upper = Bound::Included(pad_key(prefix, TermId::MAX));

        // A resume point beyond the prefix range means the scan is done.
        if let (Bound::Excluded(start), Bound::Included(end)) = (&lower, &upper) {
            if start >= end {
                return Vec::new();
            }
        }

        self.keys
            .range((lower, upper))
            .take_while(|key| key.starts_with(prefix))
            .take(limit)
            .copied()
            .collect()
    }

    /// Iterate every key in order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexKey> {
        self.keys.iter()
    }
}

/// Fill the unbound tail of a prefix with `fill`.
fn pad_key(prefix: &[TermId], fill: TermId) -> IndexKey {
    let mut key = [fill; 3];
    key[..prefix.len()].copy_from_slice(prefix);
    key
}
