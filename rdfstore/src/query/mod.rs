//! Pattern matching over a triple store.
//!
//! This module turns triple patterns into cursors and cursor output into
//! variable bindings:
//! - `planner` picks the index order for a pattern
//! - `cursor` walks the chosen index over a store snapshot
//! - `nodes` projects one field of each match
//! - `stream` adapts a cursor to `futures::Stream`
//! - `bindings` maps matches to named variables
//!
//! # Example
//!
//! ```ignore
//! use rdfstore::query::{PatternElement, QueryPattern};
//!
//! let pattern = QueryPattern::new(
//!     PatternElement::var("s"),
//!     PatternElement::term(Term::iri(RDF_TYPE)),
//!     PatternElement::var("o"),
//! );
//!
//! for bindings in store.solutions(&pattern)? {
//!     println!("{}", bindings?);
//! }
//! ```

pub mod bindings;
mod cursor;
pub mod nodes;
mod pattern;
pub mod planner;
mod stream;

pub use bindings::{BindingMap, QueryResult, ResultRow, RowTemplate, Solutions};
pub use cursor::{Cursor, CursorError, CursorState};
pub use nodes::{NodeCursor, NodeField};
pub use pattern::{Pattern, PatternElement, QueryPattern, Variable};
pub use planner::QueryPlan;
pub use stream::CursorStream;
