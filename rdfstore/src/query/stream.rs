//! `futures::Stream` adapter for cursors.
//!
//! Cursor steps never wait on I/O, so every poll is immediately ready. The
//! adapter exists for async consumers that compose streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::query::{Cursor, CursorError};
use crate::types::Triple;

/// A cursor consumed as a stream of triples.
///
/// Dropping the stream closes the cursor.
#[derive(Debug)]
pub struct CursorStream {
    cursor: Cursor,
}

impl CursorStream {
    /// Wrap a cursor.
    #[must_use]
    pub const fn new(cursor: Cursor) -> Self {
        Self { cursor }
    }

    /// Get the underlying cursor back.
    #[must_use]
    pub fn into_inner(self) -> Cursor {
        self.cursor
    }
}

impl From<Cursor> for CursorStream {
    fn from(cursor: Cursor) -> Self {
        Self::new(cursor)
    }
}

impl Stream for CursorStream {
    type Item = Result<Triple, CursorError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().cursor.next())
    }
}
