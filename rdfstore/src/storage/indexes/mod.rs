//! Index implementations for the triple store.
//!
//! Indexes provide efficient access patterns for triple data:
//! - Primary index: encoded triple -> MVCC version chain (authoritative set)
//! - Ordered indexes: one per rotation of (S, P, O), holding id keys only
//!
//! # Key Format
//!
//! An `IndexKey` is three `TermId`s laid out in the index's rotation order:
//!
//! - SPO: `(subject, predicate, object)`
//! - POS: `(predicate, object, subject)`
//! - OSP: `(object, subject, predicate)`
//!
//! Every subset of bound positions is a leading prefix of one of these three
//! rotations, so every pattern can be answered by a prefix range scan.

pub mod ordered;
pub mod primary;

use std::fmt;

use crate::types::{Position, TermId};

/// Three ids in an index's rotation order.
pub type IndexKey = [TermId; 3];

/// A triple expressed as term ids, in (S, P, O) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncodedTriple {
    pub subject: TermId,
    pub predicate: TermId,
    pub object: TermId,
}

impl EncodedTriple {
    /// Create an encoded triple.
    #[must_use]
    pub const fn new(subject: TermId, predicate: TermId, object: TermId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Get the id at a position.
    #[must_use]
    pub const fn get(&self, position: Position) -> TermId {
        match position {
            Position::Subject => self.subject,
            Position::Predicate => self.predicate,
            Position::Object => self.object,
        }
    }
}

/// Closed set of index orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOrder {
    Spo,
    Pos,
    Osp,
}

impl IndexOrder {
    /// All orders, in tie-break preference order.
    pub const ALL: [Self; 3] = [Self::Spo, Self::Pos, Self::Osp];

    /// Order used when a pattern has no bound position.
    pub const DEFAULT: Self = Self::Spo;

    /// Triple positions in key order.
    #[must_use]
    pub const fn positions(self) -> [Position; 3] {
        match self {
            Self::Spo => [Position::Subject, Position::Predicate, Position::Object],
            Self::Pos => [Position::Predicate, Position::Object, Position::Subject],
            Self::Osp => [Position::Object, Position::Subject, Position::Predicate],
        }
    }

    /// Build this order's key for a triple.
    #[must_use]
    pub const fn key(self, triple: &EncodedTriple) -> IndexKey {
        let [a, b, c] = self.positions();
        [triple.get(a), triple.get(b), triple.get(c)]
    }

    /// Recover the triple from one of this order's keys.
    #[must_use]
    pub const fn decode(self, key: &IndexKey) -> EncodedTriple {
        match self {
            Self::Spo => EncodedTriple::new(key[0], key[1], key[2]),
            Self::Pos => EncodedTriple::new(key[2], key[0], key[1]),
            Self::Osp => EncodedTriple::new(key[1], key[2], key[0]),
        }
    }

    /// Short name of the order.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spo => "spo",
            Self::Pos => "pos",
            Self::Osp => "osp",
        }
    }
}

impl fmt::Display for IndexOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
