//! Triple store storage engine.
//!
//! An in-memory, hexastore-style engine: every triple is reachable through
//! three rotations of (S, P, O), keyed by interned term ids.
//!
//! # Layout
//!
//! - `dictionary`: term <-> id interning, append-only
//! - `indexes::primary`: encoded triple -> MVCC version chain (authoritative)
//! - `indexes::ordered`: SPO, POS and OSP sorted key sets
//! - `store`: the `TripleStore` tying them together
//! - `gc`: background tombstone collection
//!
//! # Usage
//!
//! ```ignore
//! use rdfstore::{Pattern, StoreConfig, Term, Triple, TripleStore};
//!
//! let store = Arc::new(TripleStore::new("main", StoreConfig::default()));
//! store.insert(&Triple::new(Term::iri("a"), Term::iri("knows"), Term::iri("b")))?;
//!
//! let mut cursor = store.lookup(&Pattern::new(Some(Term::iri("a")), None, None))?;
//! while cursor.advance()? {
//!     println!("{}", cursor.current()?);
//! }
//! ```

pub mod dictionary;
pub mod gc;
pub mod indexes;
mod store;

pub use gc::{GcConfig, spawn_gc_task};
pub use indexes::IndexOrder;
pub use store::{
    GcReport, InsertOutcome, RemoveOutcome, Snapshot, StoreError, StoreStats, TripleStore,
};
