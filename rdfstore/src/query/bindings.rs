//! Variable bindings for query results.
//!
//! A `RowTemplate` records, for each variable of a `QueryPattern` in
//! declaration order, the triple positions it occupies. Applying the template
//! to a matching triple yields a `ResultRow` (terms in variable order) or a
//! `BindingMap` (variable name -> term).
//!
//! A variable repeated across positions, as in `?x ex:knows ?x`, only binds
//! when every occurrence holds an equal term. Other triples produce no row;
//! this is ordinary filtering, not an error.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::query::{Cursor, CursorError, QueryPattern, Variable};
use crate::storage::{StoreError, TripleStore};
use crate::types::{Position, Term, Triple};

/// A variable and the positions it was declared at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VariableSlot {
    variable: Variable,
    positions: Vec<Position>,
}

/// Where each variable of a pattern is read from.
///
/// # Invariants
/// - Slots are in first-declaration order (subject, predicate, object)
/// - Each slot has at least one position; no position is in two slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTemplate {
    slots: Vec<VariableSlot>,
}

impl RowTemplate {
    /// Build the template of a query pattern.
    #[must_use]
    pub fn from_pattern(pattern: &QueryPattern) -> Self {
        let mut slots: Vec<VariableSlot> = Vec::new();
        for position in Position::ALL {
            let Some(variable) = pattern.get(position).as_variable() else {
                continue;
            };
            if let Some(slot) = slots.iter_mut().find(|slot| slot.variable == *variable) {
                slot.positions.push(position);
            } else {
                slots.push(VariableSlot {
                    variable: variable.clone(),
                    positions: vec![position],
                });
            }
        }
        Self { slots }
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.slots.iter().map(|slot| &slot.variable)
    }

    /// Variable names in declaration order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.variables().map(|v| v.name.clone()).collect()
    }

    /// Number of distinct variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the pattern declared no variable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Terms bound for one matching triple, in variable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultRow {
    pub values: Vec<Term>,
}

/// Read a row out of a triple.
///
/// Returns `None` if a repeated variable would bind unequal terms.
#[must_use]
pub fn row(template: &RowTemplate, triple: &Triple) -> Option<ResultRow> {
    let mut values = Vec::with_capacity(template.len());
    for slot in &template.slots {
        let (first, rest) = slot.positions.split_first()?;
        let term = triple.get(*first);
        if rest.iter().any(|position| triple.get(*position) != term) {
            return None;
        }
        values.push(term.clone());
    }
    Some(ResultRow { values })
}

/// Bind the variables of a template against a triple.
///
/// Returns `None` if a repeated variable would bind unequal terms.
#[must_use]
pub fn extract(template: &RowTemplate, triple: &Triple) -> Option<BindingMap> {
    row(template, triple).map(|row| BindingMap::from_row(template, row))
}

/// Variable name -> term, in declaration order.
///
/// Holds exactly the variables of the originating pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingMap {
    entries: Vec<(String, Term)>,
}

impl BindingMap {
    fn from_row(template: &RowTemplate, row: ResultRow) -> Self {
        let entries = template
            .variables()
            .map(|v| v.name.clone())
            .zip(row.values)
            .collect();
        Self { entries }
    }

    /// Get the term bound to a variable name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, term)| term)
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(name, term)| (name.as_str(), term))
    }

    /// Build a binding map from `(name, term)` pairs.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Term)>,
        S: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }
}

impl Serialize for BindingMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, term) in &self.entries {
            map.serialize_entry(name, term)?;
        }
        map.end()
    }
}

impl fmt::Display for BindingMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {term}")?;
        }
        write!(f, "}}")
    }
}

/// Binding maps for the triples a cursor yields.
///
/// Triples where a repeated variable disagrees are skipped.
#[derive(Debug)]
pub struct Solutions {
    cursor: Cursor,
    template: RowTemplate,
}

impl Solutions {
    /// Pair a cursor with the template of the pattern it was opened for.
    #[must_use]
    pub const fn new(cursor: Cursor, template: RowTemplate) -> Self {
        Self { cursor, template }
    }

    /// The template rows are extracted with.
    #[must_use]
    pub const fn template(&self) -> &RowTemplate {
        &self.template
    }

    /// Stop early, releasing the cursor's snapshot.
    pub fn close(&mut self) {
        self.cursor.close();
    }
}

impl Iterator for Solutions {
    type Item = Result<BindingMap, CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let triple = match self.cursor.next()? {
                Ok(triple) => triple,
                Err(e) => return Some(Err(e)),
            };
            if let Some(bindings) = extract(&self.template, &triple) {
                return Some(Ok(bindings));
            }
            tracing::trace!("skipping {triple}: repeated variable binds unequal terms");
        }
    }
}

/// Materialized solutions of a pattern.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// The variable names in order.
    pub columns: Vec<String>,
    /// The result rows.
    pub rows: Vec<BindingMap>,
}

impl QueryResult {
    /// Get the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TripleStore {
    /// Open a lazy sequence of binding maps for a query pattern.
    pub fn solutions(self: &Arc<Self>, pattern: &QueryPattern) -> Result<Solutions, StoreError> {
        let cursor = self.lookup(&pattern.to_pattern())?;
        Ok(Solutions::new(cursor, RowTemplate::from_pattern(pattern)))
    }

    /// Collect every binding map for a query pattern.
    pub fn select(self: &Arc<Self>, pattern: &QueryPattern) -> Result<QueryResult, CursorError> {
        let solutions = self.solutions(pattern)?;
        let columns = solutions.template().columns();
        let rows = solutions.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("{pattern} produced {} rows", rows.len());
        Ok(QueryResult { columns, rows })
    }
}
