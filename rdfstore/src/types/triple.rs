use std::fmt;

use serde::Serialize;

use crate::types::{Term, TermKind};

/// One of the three positions of a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl Position {
    /// All positions in S, P, O order.
    pub const ALL: [Self; 3] = [Self::Subject, Self::Predicate, Self::Object];

    /// Index of this position in an (S, P, O) array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Subject => 0,
            Self::Predicate => 1,
            Self::Object => 2,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::Predicate => write!(f, "predicate"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Why a triple was refused at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The subject or predicate is not an IRI or blank node.
    InvalidTermPosition { position: Position, kind: TermKind },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTermPosition { position, kind } => {
                write!(f, "a {kind} cannot appear in {position} position")
            }
        }
    }
}

/// An RDF statement.
///
/// INVARIANT: a `Triple` held by the store always has a node subject and a
/// node predicate. Triples built by callers are checked by `validate` before
/// any index is touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    /// Create a new triple. No validation is performed here.
    #[must_use]
    pub const fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Get the term at a position.
    #[must_use]
    pub const fn get(&self, position: Position) -> &Term {
        match position {
            Position::Subject => &self.subject,
            Position::Predicate => &self.predicate,
            Position::Object => &self.object,
        }
    }

    /// Check the subject/predicate kind restrictions.
    pub fn validate(&self) -> Result<(), RejectReason> {
        for position in [Position::Subject, Position::Predicate] {
            let term = self.get(position);
            if !term.is_node() {
                return Err(RejectReason::InvalidTermPosition {
                    position,
                    kind: term.kind(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
