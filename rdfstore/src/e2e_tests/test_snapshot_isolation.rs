//! Test that cursors read a fixed snapshot while the store changes.

use std::collections::HashSet;

use crate::e2e_tests::helpers::{drain, matching};
use crate::query::Pattern;
use crate::testing::{ex, store_with, triple};

#[test]
fn test_cursor_does_not_see_later_inserts() {
    let store = store_with(&[triple("a", "p", "b")]);
    let cursor = store
        .lookup(&Pattern::new(Some(ex("a")), None, None))
        .expect("lookup");

    store.insert(&triple("a", "p", "c")).expect("insert");

    assert_eq!(drain(cursor), HashSet::from([triple("a", "p", "b")]));
    assert_eq!(
        matching(&store, &Pattern::new(Some(ex("a")), None, None)).len(),
        2
    );
}

#[test]
fn test_cursor_still_sees_removed_triple() {
    let store = store_with(&[triple("a", "p", "b"), triple("a", "p", "c")]);
    let cursor = store.lookup(&Pattern::any()).expect("lookup");

    store.remove(&triple("a", "p", "b")).expect("remove");
    store.collect_garbage().expect("gc");

    assert_eq!(
        drain(cursor),
        HashSet::from([triple("a", "p", "b"), triple("a", "p", "c")])
    );
    assert_eq!(
        matching(&store, &Pattern::any()),
        HashSet::from([triple("a", "p", "c")])
    );
}

#[test]
fn test_remove_and_reinsert_during_scan() {
    let store = store_with(&[triple("a", "p", "b")]);
    let before = store.lookup(&Pattern::any()).expect("lookup");

    store.remove(&triple("a", "p", "b")).expect("remove");
    let between = store.lookup(&Pattern::any()).expect("lookup");
    store.insert(&triple("a", "p", "b")).expect("insert");
    let after = store.lookup(&Pattern::any()).expect("lookup");
    store.collect_garbage().expect("gc");

    assert_eq!(drain(before), HashSet::from([triple("a", "p", "b")]));
    assert!(drain(between).is_empty());
    assert_eq!(drain(after), HashSet::from([triple("a", "p", "b")]));
    assert!(store.verify_integrity().is_ok());
}

#[test]
fn test_partially_consumed_cursor_never_duplicates() {
    let triples: Vec<_> = (0..200).map(|i| triple("s", "p", &format!("o{i:03}"))).collect();
    let store = store_with(&triples);
    let mut cursor = store
        .lookup(&Pattern::new(Some(ex("s")), None, None))
        .expect("lookup");

    let mut seen = HashSet::new();
    for i in 0..100 {
        assert_eq!(cursor.advance(), Ok(true));
        assert!(seen.insert(cursor.current().expect("current").clone()));
        // Writes interleaved with the scan, on both sides of its position.
        store.insert(&triple("s", "p", &format!("n{i:03}"))).expect("insert");
        store.remove(&triples[199 - i]).expect("remove");
    }
    while cursor.advance().expect("advance") {
        assert!(seen.insert(cursor.current().expect("current").clone()));
    }

    assert_eq!(seen, triples.into_iter().collect::<HashSet<_>>());
}
