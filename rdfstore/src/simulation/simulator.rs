//! Main simulator harness for deterministic simulation testing.
//!
//! Drives a `TripleStore` with generated operations, mirrors every write in
//! a `ReferenceModel` and checks invariants after each step. Cursors opened
//! by the run stay open across later writes and garbage collection passes;
//! when one is exhausted, its output must equal the model as it was when the
//! cursor was opened.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::query::{Cursor, Pattern};
use crate::storage::{InsertOutcome, RemoveOutcome, TripleStore};
use crate::types::Triple;

use super::invariants::{InvariantChecker, InvariantViolation, ReferenceModel};
use super::ops::{CursorAction, Operation, OperationGenConfig, OperationGenerator};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Operation generation configuration.
    pub operation_config: OperationGenConfig,
    /// Store configuration.
    pub store_config: StoreConfig,
    /// Run the full integrity check every this many operations.
    pub integrity_interval: usize,
    /// Maximum number of cursors held open at once.
    pub max_open_cursors: usize,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            operation_config: OperationGenConfig::default(),
            store_config: StoreConfig {
                gc_batch_size: 4,
                ..StoreConfig::default()
            },
            integrity_interval: 25,
            max_open_cursors: 4,
        }
    }

    /// Set the malformed insert rate.
    #[must_use]
    pub const fn with_malformed_rate(mut self, rate: f64) -> Self {
        self.operation_config.malformed_rate = rate;
        self
    }

    /// Set the operation configuration.
    #[must_use]
    pub fn with_operation_config(mut self, config: OperationGenConfig) -> Self {
        self.operation_config = config;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations executed.
    pub operations: usize,
    /// Inserts that added a triple.
    pub inserted: usize,
    /// Inserts rejected as malformed.
    pub rejected: usize,
    /// Removals that removed a triple.
    pub removed: usize,
    /// Cursors drained to exhaustion and compared.
    pub cursors_checked: usize,
    /// Live triples at the end of the run, sorted.
    pub final_triples: Vec<Triple>,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }
}

/// A cursor held open across operations.
struct OpenCursor {
    cursor: Cursor,
    pattern: Pattern,
    /// Model matches when the cursor was opened.
    expected: HashSet<Triple>,
    seen: HashSet<Triple>,
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    generator: OperationGenerator,
    store: Arc<TripleStore>,
    model: ReferenceModel,
    checker: InvariantChecker,
    open: Vec<OpenCursor>,
    result: SimulationResult,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator =
            OperationGenerator::with_config(config.seed, config.operation_config.clone());
        let store = Arc::new(TripleStore::new(
            format!("sim-{}", config.seed),
            config.store_config.clone(),
        ));
        let result = SimulationResult {
            seed: config.seed,
            operations: 0,
            inserted: 0,
            rejected: 0,
            removed: 0,
            cursors_checked: 0,
            final_triples: Vec::new(),
            invariant_violations: Vec::new(),
        };
        Self {
            config,
            generator,
            store,
            model: ReferenceModel::new(),
            checker: InvariantChecker::new(),
            open: Vec::new(),
            result,
        }
    }

    /// The store under test.
    #[must_use]
    pub const fn store(&self) -> &Arc<TripleStore> {
        &self.store
    }

    /// Run `count` operations, then drain every cursor still open and run
    /// the final checks.
    pub fn run(mut self, count: usize) -> SimulationResult {
        for i in 0..count {
            let operation = self.generator.next_operation();
            self.execute(i, operation);
            self.checker.check_len(i, &self.store, &self.model);
            if (i + 1) % self.config.integrity_interval == 0 {
                self.checker.check_integrity(i, &self.store);
            }
            self.result.operations += 1;
        }

        while let Some(open) = self.open.pop() {
            self.drain(count, open);
        }
        if let Err(e) = self.store.collect_garbage() {
            self.checker.violation(count, format!("final gc failed: {e}"));
        }
        self.checker.check_integrity(count, &self.store);
        match self.store.stats() {
            Ok(stats) if stats.tombstones == 0 && stats.active_snapshots == 0 => {}
            Ok(stats) => self.checker.violation(
                count,
                format!(
                    "after closing every cursor and collecting: {} tombstones, {} snapshots",
                    stats.tombstones, stats.active_snapshots
                ),
            ),
            Err(e) => self.checker.violation(count, format!("stats failed: {e}")),
        }

        let mut final_triples = self
            .store
            .triples_matching(&Pattern::any())
            .unwrap_or_default();
        final_triples.sort();
        self.result.final_triples = final_triples;
        self.result.invariant_violations = self.checker.into_violations();
        self.result
    }

    fn execute(&mut self, i: usize, operation: Operation) {
        match operation {
            Operation::Insert(triple) => self.insert(i, triple),
            Operation::Remove(triple) => self.remove(i, &triple),
            Operation::Lookup { pattern, forced } => {
                self.checker
                    .check_pattern(i, &self.store, &self.model, &pattern, forced);
            }
            Operation::OpenCursor(pattern) => self.open_cursor(i, pattern),
            Operation::Cursor(action) => self.cursor_action(i, action),
            Operation::CollectGarbage => {
                if let Err(e) = self.store.collect_garbage() {
                    self.checker.violation(i, format!("gc failed: {e}"));
                }
            }
        }
    }

    fn insert(&mut self, i: usize, triple: Triple) {
        let outcome = match self.store.insert(&triple) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.checker.violation(i, format!("insert {triple} failed: {e}"));
                return;
            }
        };

        let malformed = triple.validate().is_err();
        let new = !malformed && self.model.insert(triple.clone());
        let expected = match outcome {
            InsertOutcome::Rejected(_) => malformed,
            InsertOutcome::Inserted => new,
            InsertOutcome::AlreadyPresent => !malformed && !new,
        };
        if !expected {
            self.checker
                .violation(i, format!("insert {triple} returned unexpected {outcome:?}"));
        }
        match outcome {
            InsertOutcome::Inserted => self.result.inserted += 1,
            InsertOutcome::Rejected(_) => self.result.rejected += 1,
            InsertOutcome::AlreadyPresent => {}
        }
    }

    fn remove(&mut self, i: usize, triple: &Triple) {
        let expected = if self.model.remove(triple) {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotFound
        };
        match self.store.remove(triple) {
            Ok(outcome) if outcome == expected => {
                if outcome == RemoveOutcome::Removed {
                    self.result.removed += 1;
                }
            }
            Ok(outcome) => self.checker.violation(
                i,
                format!("remove {triple} returned {outcome:?}, expected {expected:?}"),
            ),
            Err(e) => self.checker.violation(i, format!("remove {triple} failed: {e}")),
        }
    }

    fn open_cursor(&mut self, i: usize, pattern: Pattern) {
        if self.open.len() >= self.config.max_open_cursors {
            return;
        }
        match self.store.lookup(&pattern) {
            Ok(cursor) => self.open.push(OpenCursor {
                cursor,
                expected: self.model.matching(&pattern),
                pattern,
                seen: HashSet::new(),
            }),
            Err(e) => self.checker.violation(i, format!("lookup {pattern} failed: {e}")),
        }
    }

    fn cursor_action(&mut self, i: usize, action: CursorAction) {
        if self.open.is_empty() {
            return;
        }
        let index = self.generator.pick_index(self.open.len());
        match action {
            CursorAction::Close => {
                let mut open = self.open.swap_remove(index);
                open.cursor.close();
            }
            CursorAction::Step => {
                let open = &mut self.open[index];
                match open.cursor.advance() {
                    Ok(true) => match open.cursor.current() {
                        Ok(triple) => {
                            if !open.seen.insert(triple.clone()) {
                                self.checker.violation(
                                    i,
                                    format!("cursor for {} yielded {triple} twice", open.pattern),
                                );
                            }
                        }
                        Err(e) => self.checker.violation(i, format!("current failed: {e}")),
                    },
                    Ok(false) => {
                        let open = self.open.swap_remove(index);
                        self.compare(i, &open);
                    }
                    Err(e) => self.checker.violation(i, format!("advance failed: {e}")),
                }
            }
        }
    }

    fn drain(&mut self, i: usize, mut open: OpenCursor) {
        loop {
            match open.cursor.advance() {
                Ok(true) => {
                    if let Ok(triple) = open.cursor.current() {
                        if !open.seen.insert(triple.clone()) {
                            self.checker.violation(
                                i,
                                format!("cursor for {} yielded {triple} twice", open.pattern),
                            );
                        }
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    self.checker.violation(i, format!("advance failed: {e}"));
                    return;
                }
            }
        }
        self.compare(i, &open);
    }

    fn compare(&mut self, i: usize, open: &OpenCursor) {
        self.result.cursors_checked += 1;
        if open.seen != open.expected {
            self.checker.violation(
                i,
                format!(
                    "cursor for {} saw {} triples, its snapshot holds {}",
                    open.pattern,
                    open.seen.len(),
                    open.expected.len()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::init_tracing;

    fn assert_passed(result: &SimulationResult) {
        assert!(
            result.passed(),
            "seed {} failed with {} violations, first: {:?}",
            result.seed,
            result.invariant_violations.len(),
            result.invariant_violations.first()
        );
    }

    #[test]
    fn test_simulation_seeds() {
        init_tracing();
        for seed in 0..20 {
            let result = Simulator::new(SimulatorConfig::new(seed)).run(500);
            assert_passed(&result);
            assert_eq!(result.operations, 500);
        }
    }

    #[test]
    fn test_simulation_exercises_store() {
        let result = Simulator::new(SimulatorConfig::new(42)).run(2000);
        assert_passed(&result);
        assert!(result.inserted > 0);
        assert!(result.removed > 0);
        assert!(result.rejected > 0);
        assert!(result.cursors_checked > 0);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let first = Simulator::new(SimulatorConfig::new(99)).run(800);
        let second = Simulator::new(SimulatorConfig::new(99)).run(800);
        assert_eq!(first.final_triples, second.final_triples);
        assert_eq!(first.inserted, second.inserted);
        assert_eq!(first.removed, second.removed);
        assert_eq!(first.cursors_checked, second.cursors_checked);
    }

    #[test]
    fn test_simulation_without_malformed_inserts() {
        let result = Simulator::new(SimulatorConfig::new(5).with_malformed_rate(0.0)).run(500);
        assert_passed(&result);
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_simulation_cursor_heavy() {
        let config = SimulatorConfig::new(11).with_operation_config(OperationGenConfig {
            cursor_weight: 12,
            gc_weight: 3,
            ..OperationGenConfig::default()
        });
        let simulator = Simulator::new(config);
        assert!(simulator.store().is_empty());

        let result = simulator.run(1000);
        assert_passed(&result);
        assert!(result.cursors_checked > 0);
    }
}
