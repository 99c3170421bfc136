//! ID types for interned terms and write stamps.
//!
//! Index keys never hold terms directly. Every term is interned once in the
//! store's dictionary and referred to by its `TermId` from then on.

use std::fmt;

/// Write stamp assigned to every mutation of the store.
///
/// Stamps start at 1 and increase by one per committed write. A value of 0
/// in a `deleted_txn` slot means "not deleted".
pub type TxnId = u64;

/// A dense identifier for an interned term.
///
/// # Invariants
///
/// - Ids are assigned in interning order starting at 0.
/// - An id is never reused for a different term for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TermId(pub u64);

impl TermId {
    /// Smallest possible id, used as the lower bound of prefix scans.
    pub const MIN: Self = Self(0);
    /// Largest possible id, used as the upper bound of prefix scans.
    pub const MAX: Self = Self(u64::MAX);

    /// Get the id as an index into the dictionary's term table.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl From<u64> for TermId {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl From<TermId> for u64 {
    fn from(id: TermId) -> Self {
        id.0
    }
}
