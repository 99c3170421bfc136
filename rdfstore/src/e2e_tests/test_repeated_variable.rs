//! Test patterns that repeat a variable across positions.

use crate::e2e_tests::helpers::{people_store, rendered};
use crate::query::{BindingMap, PatternElement, QueryPattern};
use crate::testing::{ex, store_with, triple};

#[test]
fn test_repeated_variable_keeps_only_equal_positions() {
    let store = store_with(&[triple("a", "knows", "a"), triple("a", "knows", "b")]);
    let pattern = QueryPattern::new(
        PatternElement::var("x"),
        PatternElement::term(ex("knows")),
        PatternElement::var("x"),
    );

    let result = store.select(&pattern).expect("select");

    assert_eq!(result.columns, vec!["x".to_owned()]);
    assert_eq!(result.rows, vec![BindingMap::from_pairs([("x", ex("a"))])]);
}

#[test]
fn test_repeated_variable_with_free_predicate() {
    let store = people_store();
    let pattern = QueryPattern::new(
        PatternElement::var("x"),
        PatternElement::var("p"),
        PatternElement::var("x"),
    );

    let result = store.select(&pattern).expect("select");

    assert_eq!(
        rendered(&result.rows),
        rendered(&[BindingMap::from_pairs([
            ("x", ex("carol")),
            ("p", ex("knows")),
        ])])
    );
}

#[test]
fn test_all_rows_conflicting_yields_nothing() {
    let store = store_with(&[triple("a", "knows", "b"), triple("b", "knows", "c")]);
    let pattern = QueryPattern::new(
        PatternElement::var("x"),
        PatternElement::var("x"),
        PatternElement::var("y"),
    );
    assert!(store.select(&pattern).expect("select").is_empty());
}
