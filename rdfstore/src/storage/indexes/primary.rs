//! Primary index implementation.
//!
//! The primary index is the authoritative triple set. It maps each encoded
//! triple to its MVCC version chain.
//!
//! # Value Format
//!
//! Each version stores `created_txn` and `deleted_txn`. A version is visible
//! to a snapshot when `created_txn <= snapshot` and
//! (`deleted_txn == 0` or `deleted_txn > snapshot`). A triple removed and
//! inserted again gets a second version rather than reusing the first, so
//! snapshots taken between the two writes keep their view.

use std::collections::HashMap;

use crate::storage::indexes::EncodedTriple;
use crate::types::TxnId;

/// One lifetime of a triple in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub created_txn: TxnId,
    /// 0 while the version is live.
    pub deleted_txn: TxnId,
}

impl Version {
    /// Check if this version is visible to a snapshot.
    #[must_use]
    pub const fn is_visible(&self, snapshot_txn: TxnId) -> bool {
        self.created_txn <= snapshot_txn
            && (self.deleted_txn == 0 || self.deleted_txn > snapshot_txn)
    }

    /// Check if this version has not been deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted_txn == 0
    }
}

/// Versions of a triple, oldest first. At most the last one is live.
#[derive(Debug, Default)]
pub struct VersionChain {
    versions: Vec<Version>,
}

impl VersionChain {
    /// Check if any version is visible to a snapshot.
    #[must_use]
    pub fn is_visible(&self, snapshot_txn: TxnId) -> bool {
        self.versions.iter().any(|v| v.is_visible(snapshot_txn))
    }

    /// Check if the newest version is live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.versions.last().is_some_and(Version::is_live)
    }

    /// Number of versions in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Check if every version has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterate the versions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }
}

/// Authoritative map of triples to their version chains.
#[derive(Debug, Default)]
pub struct PrimaryIndex {
    entries: HashMap<EncodedTriple, VersionChain>,
}

impl PrimaryIndex {
    /// Create an empty primary index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a triple is live at the latest state.
    #[must_use]
    pub fn contains_live(&self, triple: &EncodedTriple) -> bool {
        self.entries.get(triple).is_some_and(VersionChain::is_live)
    }

    /// Check if a triple is visible to a snapshot.
    ///
    /// A triple with no entry is not visible; this happens for keys whose
    /// versions were collected while a scan was in flight.
    #[must_use]
    pub fn is_visible(&self, triple: &EncodedTriple, snapshot_txn: TxnId) -> bool {
        self.entries
            .get(triple)
            .is_some_and(|chain| chain.is_visible(snapshot_txn))
    }

    /// Get the version chain of a triple.
    #[must_use]
    pub fn get(&self, triple: &EncodedTriple) -> Option<&VersionChain> {
        self.entries.get(triple)
    }

    /// Start a new live version of a triple.
    ///
    /// Returns `false` without changes if the triple is already live.
    pub fn insert(&mut self, triple: EncodedTriple, created_txn: TxnId) -> bool {
        let chain = self.entries.entry(triple).or_default();
        if chain.is_live() {
            return false;
        }
        chain.versions.push(Version {
            created_txn,
            deleted_txn: 0,
        });
        true
    }

    /// Mark the live version of a triple as deleted.
    ///
    /// Returns `false` if the triple has no live version.
    pub fn mark_deleted(&mut self, triple: &EncodedTriple, deleted_txn: TxnId) -> bool {
        let Some(version) = self
            .entries
            .get_mut(triple)
            .and_then(|chain| chain.versions.last_mut())
            .filter(|v| v.is_live())
        else {
            return false;
        };
        version.deleted_txn = deleted_txn;
        true
    }

    /// Drop versions deleted at or before `horizon`.
    ///
    /// Such versions are invisible to every snapshot at or after `horizon`.
    /// Returns `(versions_removed, entry_removed)`.
    pub fn prune(&mut self, triple: &EncodedTriple, horizon: TxnId) -> (usize, bool) {
        let Some(chain) = self.entries.get_mut(triple) else {
            return (0, false);
        };
        let before = chain.versions.len();
        chain
            .versions
            .retain(|v| v.is_live() || v.deleted_txn > horizon);
        let removed = before - chain.versions.len();
        if chain.versions.is_empty() {
            self.entries.remove(triple);
            return (removed, true);
        }
        (removed, false)
    }

    /// Number of triples with at least one version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&EncodedTriple, &VersionChain)> {
        self.entries.iter()
    }
}
