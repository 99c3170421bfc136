//! Result cursors over a store snapshot.
//!
//! A cursor owns its traversal state: the chosen plan, the bound ids, the
//! last index key it visited and the current triple. It holds no lock between
//! steps; each `advance` resumes the range scan strictly after the last key
//! under short read locks.
//!
//! # State machine
//!
//! ```text
//! Created --advance(true)--> Active --advance(false)--> Exhausted
//!    |                         |                            |
//!    +-------------------------+---------close()------------+--> Closed
//! ```
//!
//! `Exhausted` is sticky and `Closed` is terminal.

use std::collections::VecDeque;
use std::fmt;

use crate::query::planner::QueryPlan;
use crate::storage::indexes::IndexKey;
use crate::storage::{IndexOrder, Snapshot, StoreError};
use crate::types::{Position, TermId, Triple, TxnId};

/// Keys fetched per index read.
const SCAN_BATCH: usize = 64;

/// Traversal state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Opened, `advance` not yet called.
    Created,
    /// Positioned on a triple.
    Active,
    /// No more triples.
    Exhausted,
    /// Closed by the caller.
    Closed,
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Active => write!(f, "active"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// A forward-only, single-pass cursor over the triples matching a pattern.
#[derive(Debug)]
pub struct Cursor {
    /// `None` for cursors known to be empty and for closed cursors.
    snapshot: Option<Snapshot>,
    plan: QueryPlan,
    prefix: Vec<TermId>,
    residual: Vec<(Position, TermId)>,
    /// Last index key visited; scans resume strictly after it.
    position: Option<IndexKey>,
    pending: VecDeque<IndexKey>,
    current: Option<Triple>,
    state: CursorState,
}

impl Cursor {
    /// Create a cursor reading at `snapshot`.
    ///
    /// # Pre-conditions
    /// - `prefix` holds the ids of the first `plan.prefix_len` positions of
    ///   `plan.order`
    /// - `residual` holds the ids of every position in `plan.residual`
    pub(crate) fn new(
        snapshot: Snapshot,
        plan: QueryPlan,
        prefix: Vec<TermId>,
        residual: Vec<(Position, TermId)>,
    ) -> Self {
        Self {
            snapshot: Some(snapshot),
            plan,
            prefix,
            residual,
            position: None,
            pending: VecDeque::new(),
            current: None,
            state: CursorState::Created,
        }
    }

    /// Create a cursor that yields nothing.
    pub(crate) const fn empty(plan: QueryPlan) -> Self {
        Self {
            snapshot: None,
            plan,
            prefix: Vec::new(),
            residual: Vec::new(),
            position: None,
            pending: VecDeque::new(),
            current: None,
            state: CursorState::Created,
        }
    }

    /// Move to the next matching triple.
    ///
    /// Returns `Ok(false)` once the cursor is exhausted, and keeps returning
    /// it on later calls.
    ///
    /// # Errors
    ///
    /// `CursorError::Closed` after `close`, or the store error that
    /// interrupted the scan.
    pub fn advance(&mut self) -> Result<bool, CursorError> {
        match self.state {
            CursorState::Closed => return Err(CursorError::Closed),
            CursorState::Exhausted => return Ok(false),
            CursorState::Created | CursorState::Active => {}
        }

        let Some(snapshot) = &self.snapshot else {
            self.finish();
            return Ok(false);
        };
        let store = snapshot.store();
        let txn = snapshot.txn();

        loop {
            if self.pending.is_empty() {
                let batch = store.scan_keys(
                    self.plan.order,
                    &self.prefix,
                    self.position.as_ref(),
                    SCAN_BATCH,
                )?;
                if batch.is_empty() {
                    self.finish();
                    return Ok(false);
                }
                self.pending.extend(batch);
            }

            let Some(key) = self.pending.pop_front() else {
                continue;
            };
            self.position = Some(key);

            let encoded = self.plan.order.decode(&key);
            if !self
                .residual
                .iter()
                .all(|(position, id)| encoded.get(*position) == *id)
            {
                continue;
            }
            if !store.is_visible(&encoded, txn)? {
                continue;
            }

            self.current = Some(store.resolve(&encoded)?);
            self.state = CursorState::Active;
            return Ok(true);
        }
    }

    /// Get the triple the cursor is positioned on.
    ///
    /// # Errors
    ///
    /// `CursorError::Closed` after `close`; `CursorError::NoCurrent` before
    /// the first successful `advance` or after exhaustion.
    pub fn current(&self) -> Result<&Triple, CursorError> {
        if self.state == CursorState::Closed {
            return Err(CursorError::Closed);
        }
        self.current.as_ref().ok_or(CursorError::NoCurrent)
    }

    /// Close the cursor, releasing its snapshot. Idempotent.
    pub fn close(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        tracing::trace!("closing cursor in state {}", self.state);
        self.state = CursorState::Closed;
        self.snapshot = None;
        self.pending.clear();
        self.current = None;
    }

    /// Current traversal state.
    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// Index the cursor scans.
    #[must_use]
    pub const fn order(&self) -> IndexOrder {
        self.plan.order
    }

    /// The plan the cursor executes.
    #[must_use]
    pub const fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Stamp the cursor reads at, while it holds a snapshot.
    #[must_use]
    pub fn snapshot_txn(&self) -> Option<TxnId> {
        self.snapshot.as_ref().map(Snapshot::txn)
    }

    /// Enter the sticky exhausted state. The snapshot is no longer needed.
    fn finish(&mut self) {
        self.state = CursorState::Exhausted;
        self.snapshot = None;
        self.pending.clear();
        self.current = None;
    }
}

/// Yields owned triples.
///
/// A store error is yielded once, after which the cursor is closed. A closed
/// cursor yields nothing.
impl Iterator for Cursor {
    type Item = Result<Triple, CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => self.current.clone().map(Ok),
            Ok(false) | Err(CursorError::Closed) => None,
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

/// Errors returned by cursor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// The cursor was closed.
    Closed,
    /// The cursor is not positioned on a triple.
    NoCurrent,
    /// The store failed during a scan step.
    Store(StoreError),
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "cursor is closed"),
            Self::NoCurrent => write!(f, "cursor is not positioned on a triple"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for CursorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Closed | Self::NoCurrent => None,
        }
    }
}

impl From<StoreError> for CursorError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
