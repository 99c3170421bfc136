//! Term dictionary.
//!
//! Interns every term stored in the triple store and maps it to a dense
//! `TermId`. Index keys are built from ids only, so the dictionary is the
//! single owner of term payloads.
//!
//! # Invariants
//!
//! - `ids[terms[i]] == TermId(i)` for every interned term.
//! - Terms are never removed: an id stays resolvable for the lifetime of the
//!   dictionary, which lets cursors resolve keys without coordinating with
//!   garbage collection.

use std::collections::HashMap;

use crate::types::{Term, TermId};

/// Bidirectional term <-> id table.
#[derive(Debug, Default)]
pub struct TermDictionary {
    ids: HashMap<Term, TermId>,
    terms: Vec<Term>,
}

impl TermDictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the id of a term without interning it.
    #[must_use]
    pub fn get_id(&self, term: &Term) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    /// Intern a term, returning its existing id if already present.
    pub fn intern(&mut self, term: &Term) -> TermId {
        if let Some(id) = self.ids.get(term) {
            return *id;
        }
        let id = TermId(self.terms.len() as u64);
        self.terms.push(term.clone());
        self.ids.insert(term.clone(), id);
        id
    }

    /// Resolve an id back to its term.
    #[must_use]
    pub fn resolve(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.as_index())
    }

    /// Number of interned terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if no term has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
