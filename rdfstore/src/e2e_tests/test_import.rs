//! Test bulk import followed by queries.

use tempfile::tempdir;

use crate::e2e_tests::helpers::{RDF_TYPE, rdf_type};
use crate::ingest::{FailureReason, import, import_file};
use crate::query::{PatternElement, QueryPattern};
use crate::testing::{EX, ex, store_with};
use crate::types::Term;

#[test]
fn test_import_then_query() {
    let store = store_with(&[]);
    let person = format!("<{EX}Person>");
    let rows = vec![
        [format!("<{EX}a>"), format!("<{RDF_TYPE}>"), person.clone()],
        ["_:anon".to_owned(), format!("<{RDF_TYPE}>"), person.clone()],
        ["\"bad\"".to_owned(), format!("<{RDF_TYPE}>"), person],
        [format!("<{EX}a>"), format!("<{EX}age>"), "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>".to_owned()],
    ];

    let report = import(&store, rows).expect("import");
    assert_eq!(report.inserted, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, 2);
    assert!(matches!(report.failures[0].reason, FailureReason::Rejected(_)));

    let result = store
        .select(&QueryPattern::new(
            PatternElement::var("who"),
            PatternElement::term(rdf_type()),
            PatternElement::term(ex("Person")),
        ))
        .expect("select");
    let mut who: Vec<Term> = result
        .rows
        .iter()
        .filter_map(|row| row.get("who").cloned())
        .collect();
    who.sort();
    assert_eq!(who, vec![ex("a"), Term::blank("anon")]);
}

#[test]
fn test_import_file_continues_past_bad_lines() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("graph.tsv");
    std::fs::write(
        &path,
        "a\tknows\tb\n\
         \"x\tknows\tb\n\
         b\tknows\tc\n\
         c knows d\n\
         c\tknows\ta\n",
    )
    .expect("write file");

    let store = store_with(&[]);
    let report = import_file(&store, &path).expect("import");

    assert_eq!(report.inserted, 3);
    assert_eq!(report.total(), 5);
    let lines: Vec<usize> = report.failures.iter().map(|f| f.item).collect();
    assert_eq!(lines, vec![2, 4]);
    assert_eq!(store.len(), 3);
}
