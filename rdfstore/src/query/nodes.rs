//! Single-field projections of a cursor.
//!
//! Graph navigation asks for one position at a time: the sources of an arc,
//! the arcs between two nodes, or the targets of an arc. A `NodeCursor` runs
//! an ordinary cursor and exposes only that position.

use crate::query::{Cursor, CursorError, CursorState};
use crate::types::{Position, Term};

/// Which field of a matching triple a `NodeCursor` yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    /// The subject.
    Source,
    /// The predicate.
    Arc,
    /// The object.
    Target,
}

impl NodeField {
    /// Triple position of this field.
    #[must_use]
    pub const fn position(self) -> Position {
        match self {
            Self::Source => Position::Subject,
            Self::Arc => Position::Predicate,
            Self::Target => Position::Object,
        }
    }
}

/// A cursor yielding one field of each matching triple.
#[derive(Debug)]
pub struct NodeCursor {
    inner: Cursor,
    field: NodeField,
}

impl NodeCursor {
    pub(crate) const fn new(inner: Cursor, field: NodeField) -> Self {
        Self { inner, field }
    }

    /// Move to the next matching triple.
    pub fn advance(&mut self) -> Result<bool, CursorError> {
        self.inner.advance()
    }

    /// Get the projected term of the current triple.
    pub fn current(&self) -> Result<&Term, CursorError> {
        Ok(self.inner.current()?.get(self.field.position()))
    }

    /// Close the cursor. Idempotent.
    pub fn close(&mut self) {
        self.inner.close();
    }

    /// Current traversal state.
    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.inner.state()
    }

    /// The projected field.
    #[must_use]
    pub const fn field(&self) -> NodeField {
        self.field
    }
}

impl Iterator for NodeCursor {
    type Item = Result<Term, CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.field.position();
        self.inner
            .next()
            .map(|item| item.map(|triple| triple.get(position).clone()))
    }
}
