#![cfg_attr(test, allow(clippy::disallowed_methods, clippy::expect_used))]
//! In-memory RDF triple store with pattern-matching cursors.
//!
//! Life of a query:
//! 1. The query engine hands over a `Pattern` (or a `QueryPattern` with
//!    named variables)
//! 2. The planner picks the SPO, POS or OSP index whose key prefix covers
//!    the most bound positions
//! 3. A `Cursor` walks that index over a snapshot of the store, skipping
//!    versions the snapshot cannot see
//! 4. For variable patterns, each matching triple becomes a `BindingMap`
//!
//! System components:
//!  - Term dictionary and indexes (`storage`)
//!  - Planner, cursors and binding extraction (`query`)
//!  - Bulk import of raw string triples (`ingest`)
//!  - Module registry for hosting engines (`registry`)

pub mod config;
pub mod ingest;
pub mod query;
pub mod registry;
pub mod storage;
pub mod types;


pub use config::{ConfigError, StoreConfig};
pub use query::{
    BindingMap, Cursor, CursorError, CursorState, CursorStream, Pattern, PatternElement,
    QueryPattern, QueryResult, Variable,
};
pub use registry::{RegistryError, StorageRegistry};
pub use storage::{InsertOutcome, RemoveOutcome, StoreError, TripleStore};
pub use types::{Literal, Position, RejectReason, Term, TermKind, Triple};
