//! Invariant checking for deterministic simulation testing.
//!
//! The store is compared against a reference model: a plain `HashSet` of
//! the triples that should be live. Every check reports violations instead of
//! panicking so a run can list all of them with its seed.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use std::collections::HashSet;
use std::sync::Arc;

use crate::query::Pattern;
use crate::storage::{IndexOrder, TripleStore};
use crate::types::Triple;

/// The expected live triple set.
#[derive(Debug, Clone, Default)]
pub struct ReferenceModel {
    triples: HashSet<Triple>,
}

impl ReferenceModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Remove a triple. Returns `false` if it was absent.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    /// Number of live triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Check if the model holds no triple.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples structurally matching a pattern.
    #[must_use]
    pub fn matching(&self, pattern: &Pattern) -> HashSet<Triple> {
        self.triples
            .iter()
            .filter(|t| pattern.matches(t))
            .cloned()
            .collect()
    }
}

/// A detected invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Index of the operation after which the violation was detected.
    pub operation: usize,
    /// Description of the violation.
    pub message: String,
}

/// Compares a store against a reference model.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    /// Create a checker with no recorded violation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn violation(&mut self, operation: usize, message: impl Into<String>) {
        self.violations.push(InvariantViolation {
            operation,
            message: message.into(),
        });
    }

    /// Check that the store's live count matches the model.
    pub fn check_len(&mut self, operation: usize, store: &TripleStore, model: &ReferenceModel) {
        if store.len() != model.len() {
            self.violation(
                operation,
                format!("store holds {} triples, model holds {}", store.len(), model.len()),
            );
        }
    }

    /// Check that a pattern yields exactly the model's matches, on the
    /// planned index and on `forced`.
    pub fn check_pattern(
        &mut self,
        operation: usize,
        store: &Arc<TripleStore>,
        model: &ReferenceModel,
        pattern: &Pattern,
        forced: IndexOrder,
    ) {
        let expected = model.matching(pattern);

        match store.triples_matching(pattern) {
            Ok(found) => {
                let found_set: HashSet<Triple> = found.iter().cloned().collect();
                if found_set.len() != found.len() {
                    self.violation(operation, format!("{pattern} yielded a duplicate triple"));
                }
                if found_set != expected {
                    self.violation(
                        operation,
                        format!(
                            "{pattern}: store yielded {} triples, model expects {}",
                            found_set.len(),
                            expected.len()
                        ),
                    );
                }
            }
            Err(e) => self.violation(operation, format!("{pattern}: lookup failed: {e}")),
        }

        let forced_result = store
            .lookup_in(forced, pattern)
            .map_err(|e| e.to_string())
            .and_then(|cursor| {
                cursor
                    .collect::<Result<HashSet<Triple>, _>>()
                    .map_err(|e| e.to_string())
            });
        match forced_result {
            Ok(found) if found == expected => {}
            Ok(found) => self.violation(
                operation,
                format!(
                    "{pattern} on {forced}: store yielded {} triples, model expects {}",
                    found.len(),
                    expected.len()
                ),
            ),
            Err(e) => self.violation(operation, format!("{pattern} on {forced}: {e}")),
        }
    }

    /// Check that the store's structures agree.
    pub fn check_integrity(&mut self, operation: usize, store: &TripleStore) {
        if let Err(e) = store.verify_integrity() {
            self.violation(operation, format!("integrity check failed: {e}"));
        }
    }

    /// Violations recorded so far.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Take the recorded violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<InvariantViolation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ex, store_with, triple};

    #[test]
    fn test_model_matching() {
        let mut model = ReferenceModel::new();
        assert!(model.is_empty());
        assert!(model.insert(triple("a", "p", "b")));
        assert!(!model.insert(triple("a", "p", "b")));
        model.insert(triple("c", "p", "b"));

        let pattern = Pattern::new(Some(ex("a")), None, None);
        assert_eq!(model.matching(&pattern).len(), 1);
        assert!(model.remove(&triple("a", "p", "b")));
        assert!(model.matching(&pattern).is_empty());
    }

    #[test]
    fn test_checker_reports_divergence() {
        let store = store_with(&[triple("a", "p", "b")]);
        let mut model = ReferenceModel::new();
        model.insert(triple("a", "p", "b"));
        model.insert(triple("a", "p", "c"));

        let mut checker = InvariantChecker::new();
        checker.check_len(0, &store, &model);
        checker.check_pattern(1, &store, &model, &Pattern::any(), IndexOrder::Osp);
        checker.check_integrity(2, &store);

        let operations: Vec<usize> = checker.violations().iter().map(|v| v.operation).collect();
        assert_eq!(operations, vec![0, 1, 1]);
    }
}
