//! High-level triple store interface.
//!
//! The `TripleStore` owns the term dictionary, the primary index and the
//! three ordered indexes, and hands out cursors over snapshots of them.
//!
//! # Concurrency
//!
//! - Writers are serialized by the writer mutex. A write takes the next
//!   stamp, mutates each structure under that structure's own write lock
//!   (never two at once), then publishes the stamp.
//! - Readers register a snapshot at the last published stamp and only see
//!   versions visible at it, so a half-applied write is never observed.
//! - Garbage collection runs under the writer mutex and only drops versions
//!   that no registered snapshot can see.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};

use tokio::sync::Notify;

use crate::config::StoreConfig;
use crate::query::planner;
use crate::query::{Cursor, CursorError, NodeCursor, NodeField, Pattern, QueryPlan};
use crate::storage::dictionary::TermDictionary;
use crate::storage::indexes::ordered::OrderedIndex;
use crate::storage::indexes::primary::PrimaryIndex;
use crate::storage::indexes::{EncodedTriple, IndexKey, IndexOrder};
use crate::types::{Position, RejectReason, Term, TermId, Triple, TxnId};

/// Result of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The triple was added.
    Inserted,
    /// An equal triple was already live; nothing changed.
    AlreadyPresent,
    /// The triple is malformed; nothing changed.
    Rejected(RejectReason),
}

/// Result of a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// A deleted version awaiting garbage collection.
///
/// # Invariants
/// - `deleted_txn > 0`
/// - Tombstones are queued in stamp order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tombstone {
    triple: EncodedTriple,
    deleted_txn: TxnId,
}

/// State guarded by the writer mutex.
#[derive(Debug, Default)]
struct WriterState {
    tombstones: VecDeque<Tombstone>,
}

/// Result of one garbage collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Tombstones taken off the queue.
    pub tombstones_processed: usize,
    /// Versions dropped from the primary index.
    pub versions_removed: usize,
    /// Triples whose last version was dropped, removing their index keys.
    pub triples_purged: usize,
    /// Tombstones still queued after this pass.
    pub tombstones_remaining: usize,
}

impl GcReport {
    fn absorb(&mut self, other: Self) {
        self.tombstones_processed += other.tombstones_processed;
        self.versions_removed += other.versions_removed;
        self.triples_purged += other.triples_purged;
        self.tombstones_remaining = other.tombstones_remaining;
    }
}

/// Point-in-time counters of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Live triples.
    pub triples: usize,
    /// Interned terms. Never decreases: collection purges triples, not terms.
    pub terms: usize,
    /// Deleted versions not yet collected.
    pub tombstones: usize,
    /// Registered cursor snapshots.
    pub active_snapshots: usize,
    /// Last published write stamp.
    pub committed_txn: TxnId,
}

/// An in-memory hexastore-style triple store.
///
/// Shared between threads as `Arc<TripleStore>`; cursors keep the store
/// alive while they are open.
#[derive(Debug)]
pub struct TripleStore {
    name: String,
    config: StoreConfig,
    dictionary: RwLock<TermDictionary>,
    primary: RwLock<PrimaryIndex>,
    spo: RwLock<OrderedIndex>,
    pos: RwLock<OrderedIndex>,
    osp: RwLock<OrderedIndex>,
    writer: Mutex<WriterState>,
    committed: AtomicU64,
    live: AtomicUsize,
    snapshots: Mutex<BTreeMap<TxnId, usize>>,
    corrupted: AtomicBool,
    gc_notify: Arc<Notify>,
}

impl TripleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(name: impl Into<String>, config: StoreConfig) -> Self {
        let name = name.into();
        tracing::debug!("creating triple store '{name}'");
        Self {
            name,
            config,
            dictionary: RwLock::new(TermDictionary::new()),
            primary: RwLock::new(PrimaryIndex::new()),
            spo: RwLock::new(OrderedIndex::new(IndexOrder::Spo)),
            pos: RwLock::new(OrderedIndex::new(IndexOrder::Pos)),
            osp: RwLock::new(OrderedIndex::new(IndexOrder::Osp)),
            writer: Mutex::new(WriterState::default()),
            committed: AtomicU64::new(0),
            live: AtomicUsize::new(0),
            snapshots: Mutex::new(BTreeMap::new()),
            corrupted: AtomicBool::new(false),
            gc_notify: Arc::new(Notify::new()),
        }
    }

    /// The name this store was created under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration this store was created with.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the notification handle signaled when tombstones pile up.
    #[must_use]
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
    pub fn gc_notify(&self) -> Arc<Notify> {
        Arc::clone(&self.gc_notify)
    }

    /// Insert a triple.
    ///
    /// Malformed triples are reported as `InsertOutcome::Rejected` before any
    /// structure is touched.
    pub fn insert(&self, triple: &Triple) -> Result<InsertOutcome, StoreError> {
        self.check_healthy()?;
        if let Err(reason) = triple.validate() {
            tracing::trace!("rejected {triple}: {reason}");
            return Ok(InsertOutcome::Rejected(reason));
        }

        let _writer = lock(&self.writer)?;

        let encoded = {
            let mut dictionary = write(&self.dictionary)?;
            EncodedTriple::new(
                dictionary.intern(&triple.subject),
                dictionary.intern(&triple.predicate),
                dictionary.intern(&triple.object),
            )
        };

        let txn = self.committed.load(Ordering::Acquire) + 1;
        if !write(&self.primary)?.insert(encoded, txn) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        for order in IndexOrder::ALL {
            write(self.index(order))?.insert(&encoded);
        }

        self.live.fetch_add(1, Ordering::AcqRel);
        self.committed.store(txn, Ordering::Release);
        tracing::trace!("inserted {triple} at txn {txn}");
        Ok(InsertOutcome::Inserted)
    }

    /// Check if a triple is currently in the store.
    pub fn contains(&self, triple: &Triple) -> Result<bool, StoreError> {
        self.check_healthy()?;
        let Some(encoded) = self.encode_existing(triple)? else {
            return Ok(false);
        };
        Ok(read(&self.primary)?.contains_live(&encoded))
    }

    /// Remove a triple.
    ///
    /// The triple stays visible to cursors opened before the removal until
    /// they are closed; its storage is reclaimed by garbage collection.
    pub fn remove(&self, triple: &Triple) -> Result<RemoveOutcome, StoreError> {
        self.check_healthy()?;
        let mut writer = lock(&self.writer)?;

        let Some(encoded) = self.encode_existing(triple)? else {
            return Ok(RemoveOutcome::NotFound);
        };

        let txn = self.committed.load(Ordering::Acquire) + 1;
        if !write(&self.primary)?.mark_deleted(&encoded, txn) {
            return Ok(RemoveOutcome::NotFound);
        }

        self.live.fetch_sub(1, Ordering::AcqRel);
        self.committed.store(txn, Ordering::Release);
        writer.tombstones.push_back(Tombstone {
            triple: encoded,
            deleted_txn: txn,
        });
        if writer.tombstones.len() >= self.config.gc_tombstone_threshold {
            self.gc_notify.notify_one();
        }
        tracing::trace!("removed {triple} at txn {txn}");
        Ok(RemoveOutcome::Removed)
    }

    /// Remove every triple matching a pattern.
    ///
    /// Returns the number of triples removed.
    pub fn remove_matching(self: &Arc<Self>, pattern: &Pattern) -> Result<usize, StoreError> {
        let matching = self.triples_matching(pattern)?;
        let mut removed = 0;
        for triple in &matching {
            if self.remove(triple)? == RemoveOutcome::Removed {
                removed += 1;
            }
        }
        tracing::debug!("removed {removed} triples matching {pattern}");
        Ok(removed)
    }

    /// Open a cursor over the triples matching a pattern, on the index the
    /// planner picks.
    pub fn lookup(self: &Arc<Self>, pattern: &Pattern) -> Result<Cursor, StoreError> {
        self.open_cursor(pattern, planner::plan(pattern))
    }

    /// Open a cursor over the triples matching a pattern, forcing an index.
    ///
    /// Bound positions outside the order's leading run are checked by the
    /// cursor's residual filter.
    pub fn lookup_in(
        self: &Arc<Self>,
        order: IndexOrder,
        pattern: &Pattern,
    ) -> Result<Cursor, StoreError> {
        self.open_cursor(pattern, planner::plan_for_order(pattern, order))
    }

    /// Collect every triple matching a pattern.
    pub fn triples_matching(self: &Arc<Self>, pattern: &Pattern) -> Result<Vec<Triple>, StoreError> {
        let mut cursor = self.lookup(pattern)?;
        let mut triples = Vec::new();
        while cursor.advance().map_err(StoreError::from_cursor)? {
            triples.push(cursor.current().map_err(StoreError::from_cursor)?.clone());
        }
        Ok(triples)
    }

    /// Subjects of triples with the given predicate and object.
    pub fn find_sources(
        self: &Arc<Self>,
        predicate: &Term,
        object: &Term,
    ) -> Result<NodeCursor, StoreError> {
        let pattern = Pattern::new(None, Some(predicate.clone()), Some(object.clone()));
        Ok(NodeCursor::new(self.lookup(&pattern)?, NodeField::Source))
    }

    /// Predicates of triples with the given subject and object.
    pub fn find_arcs(
        self: &Arc<Self>,
        subject: &Term,
        object: &Term,
    ) -> Result<NodeCursor, StoreError> {
        let pattern = Pattern::new(Some(subject.clone()), None, Some(object.clone()));
        Ok(NodeCursor::new(self.lookup(&pattern)?, NodeField::Arc))
    }

    /// Objects of triples with the given subject and predicate.
    pub fn find_targets(
        self: &Arc<Self>,
        subject: &Term,
        predicate: &Term,
    ) -> Result<NodeCursor, StoreError> {
        let pattern = Pattern::new(Some(subject.clone()), Some(predicate.clone()), None);
        Ok(NodeCursor::new(self.lookup(&pattern)?, NodeField::Target))
    }

    /// Every distinct IRI or blank node used as a subject or object.
    pub fn nodes(self: &Arc<Self>) -> Result<Vec<Term>, StoreError> {
        let mut nodes = BTreeSet::new();
        for triple in self.triples_matching(&Pattern::any())? {
            if triple.object.is_node() {
                nodes.insert(triple.object);
            }
            nodes.insert(triple.subject);
        }
        Ok(nodes.into_iter().collect())
    }

    /// Number of live triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Check if the store holds no live triple.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get point-in-time counters.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let tombstones = lock(&self.writer)?.tombstones.len();
        let active_snapshots = lock(&self.snapshots)?.values().sum();
        Ok(StoreStats {
            triples: self.len(),
            terms: read(&self.dictionary)?.len(),
            tombstones,
            active_snapshots,
            committed_txn: self.committed.load(Ordering::Acquire),
        })
    }

    /// Process up to `batch_size` tombstones.
    ///
    /// Stops early at the first tombstone still visible to a registered
    /// snapshot.
    pub fn gc_tick(&self, batch_size: usize) -> Result<GcReport, StoreError> {
        self.check_healthy()?;
        let mut writer = lock(&self.writer)?;
        let horizon = self.gc_horizon()?;

        let mut report = GcReport::default();
        for _ in 0..batch_size {
            let Some(tombstone) = writer.tombstones.front().copied() else {
                break;
            };
            if tombstone.deleted_txn > horizon {
                break;
            }
            writer.tombstones.pop_front();
            report.tombstones_processed += 1;

            let (versions, purged) = write(&self.primary)?.prune(&tombstone.triple, horizon);
            report.versions_removed += versions;
            if purged {
                for order in IndexOrder::ALL {
                    write(self.index(order))?.remove(&tombstone.triple);
                }
                report.triples_purged += 1;
            }
        }
        report.tombstones_remaining = writer.tombstones.len();
        drop(writer);

        if report.tombstones_processed > 0 {
            tracing::debug!(
                "gc on '{}': {} versions removed, {} triples purged, {} tombstones remaining",
                self.name,
                report.versions_removed,
                report.triples_purged,
                report.tombstones_remaining
            );
        }
        Ok(report)
    }

    /// Run garbage collection until no collectable tombstone remains.
    pub fn collect_garbage(&self) -> Result<GcReport, StoreError> {
        let mut total = GcReport::default();
        loop {
            let report = self.gc_tick(self.config.gc_batch_size)?;
            let progressed = report.tombstones_processed > 0;
            total.absorb(report);
            if !progressed || report.tombstones_remaining == 0 {
                return Ok(total);
            }
        }
    }

    /// Check that the ordered indexes, the primary index and the dictionary
    /// agree.
    ///
    /// On mismatch the store is marked corrupt: this and every later call
    /// fails.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        self.check_healthy()?;
        let _writer = lock(&self.writer)?;
        let primary = read(&self.primary)?;
        let dictionary = read(&self.dictionary)?;

        let live = primary.iter().filter(|(_, chain)| chain.is_live()).count();
        if live != self.len() {
            return Err(self.mark_corrupted(format!(
                "live counter is {} but primary index holds {live} live triples",
                self.len()
            )));
        }

        for (triple, _) in primary.iter() {
            for position in Position::ALL {
                if dictionary.resolve(triple.get(position)).is_none() {
                    return Err(self.mark_corrupted(format!(
                        "primary entry {triple:?} references unknown term {}",
                        triple.get(position)
                    )));
                }
            }
        }

        for order in IndexOrder::ALL {
            let index = read(self.index(order))?;
            if index.len() != primary.len() {
                return Err(self.mark_corrupted(format!(
                    "{order} index holds {} keys but primary index holds {}",
                    index.len(),
                    primary.len()
                )));
            }
            if let Some(key) = index
                .iter()
                .find(|key| primary.get(&order.decode(key)).is_none())
            {
                return Err(self.mark_corrupted(format!(
                    "{order} index key {key:?} has no primary entry"
                )));
            }
        }
        Ok(())
    }

    /// Check whether the store has been marked corrupt.
    #[must_use]
    pub fn is_corrupted(&self) -> bool {
        self.corrupted.load(Ordering::Acquire)
    }

    /// Build a cursor for a plan.
    fn open_cursor(self: &Arc<Self>, pattern: &Pattern, plan: QueryPlan) -> Result<Cursor, StoreError> {
        self.check_healthy()?;

        let mut bound: [Option<TermId>; 3] = [None; 3];
        {
            let dictionary = read(&self.dictionary)?;
            for position in Position::ALL {
                let Some(term) = pattern.get(position) else {
                    continue;
                };
                // A term never interned cannot occur in any triple.
                let Some(id) = dictionary.get_id(term) else {
                    tracing::trace!("{pattern} binds unknown term {term}, empty result");
                    return Ok(Cursor::empty(plan));
                };
                bound[position.index()] = Some(id);
            }
        }

        let prefix: Vec<TermId> = plan.order.positions()[..plan.prefix_len]
            .iter()
            .filter_map(|position| bound[position.index()])
            .collect();
        let residual: Vec<(Position, TermId)> = plan
            .residual
            .iter()
            .filter_map(|position| bound[position.index()].map(|id| (*position, id)))
            .collect();

        let snapshot = self.acquire_snapshot()?;
        tracing::trace!(
            "cursor for {pattern} on {} index (prefix {}, residual {}) at txn {}",
            plan.order,
            prefix.len(),
            residual.len(),
            snapshot.txn()
        );
        Ok(Cursor::new(snapshot, plan, prefix, residual))
    }

    /// Register a snapshot at the last published stamp.
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
    pub(crate) fn acquire_snapshot(self: &Arc<Self>) -> Result<Snapshot, StoreError> {
        let mut snapshots = lock(&self.snapshots)?;
        let txn = self.committed.load(Ordering::Acquire);
        *snapshots.entry(txn).or_insert(0) += 1;
        drop(snapshots);
        Ok(Snapshot {
            store: Arc::clone(self),
            txn,
        })
    }

    /// Drop one registration at `txn`.
    ///
    /// When the oldest stamp loses its last registration the GC horizon
    /// moves, so a collector that stopped at a pinned tombstone is woken.
    fn release_snapshot(&self, txn: TxnId) {
        let Ok(mut snapshots) = self.snapshots.lock() else {
            return;
        };
        let Some(count) = snapshots.get_mut(&txn) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        snapshots.remove(&txn);
        let was_oldest = snapshots.keys().next().is_none_or(|oldest| *oldest > txn);
        drop(snapshots);

        if was_oldest && self.has_pending_tombstones() {
            tracing::trace!("oldest snapshot at txn {txn} released, waking gc");
            self.gc_notify.notify_one();
        }
    }

    /// Check for queued tombstones without blocking.
    ///
    /// A busy writer mutex counts as pending: the holder may be queueing one.
    fn has_pending_tombstones(&self) -> bool {
        match self.writer.try_lock() {
            Ok(writer) => !writer.tombstones.is_empty(),
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        }
    }

    /// Oldest stamp any registered or future snapshot can see.
    fn gc_horizon(&self) -> Result<TxnId, StoreError> {
        let committed = self.committed.load(Ordering::Acquire);
        let oldest = lock(&self.snapshots)?.keys().next().copied();
        Ok(oldest.map_or(committed, |txn| txn.min(committed)))
    }

    /// Scan an ordered index. Used by cursors between steps.
    pub(crate) fn scan_keys(
        &self,
        order: IndexOrder,
        prefix: &[TermId],
        after: Option<&IndexKey>,
        limit: usize,
    ) -> Result<Vec<IndexKey>, StoreError> {
        self.check_healthy()?;
        Ok(read(self.index(order))?.scan(prefix, after, limit))
    }

    /// Check if an encoded triple is visible to a snapshot.
    pub(crate) fn is_visible(&self, triple: &EncodedTriple, txn: TxnId) -> Result<bool, StoreError> {
        Ok(read(&self.primary)?.is_visible(triple, txn))
    }

    /// Resolve an encoded triple to terms.
    ///
    /// An unresolvable id means an index references data the dictionary
    /// never held: the store is marked corrupt.
    pub(crate) fn resolve(&self, triple: &EncodedTriple) -> Result<Triple, StoreError> {
        let dictionary = read(&self.dictionary)?;
        let mut terms = Position::ALL.map(|position| dictionary.resolve(triple.get(position)).cloned());
        drop(dictionary);

        match (terms[0].take(), terms[1].take(), terms[2].take()) {
            (Some(subject), Some(predicate), Some(object)) => {
                Ok(Triple::new(subject, predicate, object))
            }
            _ => Err(self.mark_corrupted(format!("index entry {triple:?} references an unknown term"))),
        }
    }

    fn encode_existing(&self, triple: &Triple) -> Result<Option<EncodedTriple>, StoreError> {
        let dictionary = read(&self.dictionary)?;
        let (Some(subject), Some(predicate), Some(object)) = (
            dictionary.get_id(&triple.subject),
            dictionary.get_id(&triple.predicate),
            dictionary.get_id(&triple.object),
        ) else {
            return Ok(None);
        };
        Ok(Some(EncodedTriple::new(subject, predicate, object)))
    }

    const fn index(&self, order: IndexOrder) -> &RwLock<OrderedIndex> {
        match order {
            IndexOrder::Spo => &self.spo,
            IndexOrder::Pos => &self.pos,
            IndexOrder::Osp => &self.osp,
        }
    }

    fn check_healthy(&self) -> Result<(), StoreError> {
        if self.is_corrupted() {
            return Err(StoreError::Corrupted);
        }
        Ok(())
    }

    fn mark_corrupted(&self, detail: String) -> StoreError {
        tracing::error!("triple store '{}' is corrupt: {detail}", self.name);
        self.corrupted.store(true, Ordering::Release);
        StoreError::IndexCorruption { detail }
    }

    /// Insert a raw key into one ordered index, bypassing the primary index.
    #[cfg(test)]
    pub(crate) fn inject_index_key(&self, order: IndexOrder, triple: &EncodedTriple) {
        if let Ok(mut index) = self.index(order).write() {
            index.insert(triple);
        }
    }
}

/// A registered read view at a fixed stamp.
///
/// Releases its registration on drop, letting garbage collection advance.
#[derive(Debug)]
pub struct Snapshot {
    store: Arc<TripleStore>,
    txn: TxnId,
}

impl Snapshot {
    /// The stamp this snapshot reads at.
    #[must_use]
    pub const fn txn(&self) -> TxnId {
        self.txn
    }

    /// The store this snapshot reads from.
    #[must_use]
    pub const fn store(&self) -> &Arc<TripleStore> {
        &self.store
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        self.store.release_snapshot(self.txn);
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::LockPoisoned)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::LockPoisoned)
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An internal invariant was found violated.
    IndexCorruption { detail: String },
    /// The store was marked corrupt earlier and refuses further use.
    Corrupted,
    /// A lock was poisoned by a panicking thread.
    LockPoisoned,
}

impl StoreError {
    /// Unwrap the store error carried by a cursor error.
    ///
    /// Contract violations cannot happen on cursors the store drives itself,
    /// so they are reported as corruption.
    fn from_cursor(error: CursorError) -> Self {
        match error {
            CursorError::Store(e) => e,
            other => Self::IndexCorruption {
                detail: format!("internal cursor misuse: {other}"),
            },
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexCorruption { detail } => write!(f, "index corruption: {detail}"),
            Self::Corrupted => write!(f, "store is corrupt and refuses further use"),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}
