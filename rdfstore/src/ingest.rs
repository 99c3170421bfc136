//! Bulk import of raw string triples.
//!
//! Each raw triple is three strings converted to terms and inserted one at a
//! time. A triple that fails to convert or is rejected by the store is
//! reported and skipped; the rest of the batch still goes in.
//!
//! # Raw term syntax
//!
//! - `_:label` - blank node
//! - `"value"`, `"value"@lang`, `"value"^^<datatype>` - literal
//! - `<iri>` or any other non-empty string - IRI
//!
//! No escape processing is done: the lexical form of a literal is everything
//! between the first and the last double quote.
//!
//! # File format
//!
//! `import_file` reads one triple per line as three tab-separated raw terms.
//! Blank lines and lines starting with `#` are ignored.

use std::fmt;
use std::path::Path;

use crate::storage::{InsertOutcome, StoreError, TripleStore};
use crate::types::{Position, RejectReason, Term, Triple};

/// Why a raw string could not be converted to a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermParseError {
    /// The raw string is empty.
    Empty,
    /// `_:` with no label.
    EmptyBlankLabel,
    /// `<` with no closing `>`, or nothing between them.
    MalformedIri(String),
    /// A literal with no closing quote.
    UnterminatedLiteral(String),
    /// Text after a literal's closing quote is neither `@lang` nor
    /// `^^<datatype>`.
    InvalidLiteralSuffix(String),
}

impl fmt::Display for TermParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty term"),
            Self::EmptyBlankLabel => write!(f, "blank node without a label"),
            Self::MalformedIri(raw) => write!(f, "malformed IRI: {raw}"),
            Self::UnterminatedLiteral(raw) => write!(f, "unterminated literal: {raw}"),
            Self::InvalidLiteralSuffix(suffix) => {
                write!(f, "invalid literal suffix: {suffix}")
            }
        }
    }
}

impl std::error::Error for TermParseError {}

/// Convert a raw string to a term.
pub fn parse_term(raw: &str) -> Result<Term, TermParseError> {
    if raw.is_empty() {
        return Err(TermParseError::Empty);
    }
    if let Some(label) = raw.strip_prefix("_:") {
        if label.is_empty() {
            return Err(TermParseError::EmptyBlankLabel);
        }
        return Ok(Term::blank(label));
    }
    if let Some(body) = raw.strip_prefix('"') {
        return parse_literal(raw, body);
    }
    if let Some(body) = raw.strip_prefix('<') {
        return match body.strip_suffix('>') {
            Some(iri) if !iri.is_empty() => Ok(Term::iri(iri)),
            _ => Err(TermParseError::MalformedIri(raw.to_owned())),
        };
    }
    Ok(Term::iri(raw))
}

/// Parse what follows a literal's opening quote.
fn parse_literal(raw: &str, body: &str) -> Result<Term, TermParseError> {
    let Some(close) = body.rfind('"') else {
        return Err(TermParseError::UnterminatedLiteral(raw.to_owned()));
    };
    let value = &body[..close];
    let suffix = &body[close + 1..];

    if suffix.is_empty() {
        return Ok(Term::literal(value));
    }
    if let Some(language) = suffix.strip_prefix('@') {
        if !language.is_empty() {
            return Ok(Term::lang_literal(value, language));
        }
    }
    if let Some(datatype) = suffix
        .strip_prefix("^^<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        if !datatype.is_empty() {
            return Ok(Term::typed_literal(value, datatype));
        }
    }
    Err(TermParseError::InvalidLiteralSuffix(suffix.to_owned()))
}

/// Why one raw triple was not inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A file line did not hold exactly three tab-separated fields.
    MalformedLine { fields: usize },
    /// A raw term could not be converted.
    InvalidTerm {
        position: Position,
        error: TermParseError,
    },
    /// The store refused the triple.
    Rejected(RejectReason),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedLine { fields } => {
                write!(f, "expected 3 tab-separated fields, found {fields}")
            }
            Self::InvalidTerm { position, error } => write!(f, "invalid {position}: {error}"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// A raw triple that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// Index of the item in the input (0-based), or its line number
    /// (1-based) for `import_file`.
    pub item: usize,
    pub reason: FailureReason,
}

/// Per-triple results of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Triples newly added.
    pub inserted: usize,
    /// Triples that were already in the store.
    pub already_present: usize,
    /// Triples skipped, in input order.
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// Total number of items seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserted + self.already_present + self.failures.len()
    }

    fn record_failure(&mut self, item: usize, reason: FailureReason) {
        tracing::warn!("skipping import item {item}: {reason}");
        self.failures.push(ImportFailure { item, reason });
    }

    fn import_one<S: AsRef<str>>(
        &mut self,
        store: &TripleStore,
        item: usize,
        raw: &[S; 3],
    ) -> Result<(), StoreError> {
        let triple = match convert(raw) {
            Ok(triple) => triple,
            Err(reason) => {
                self.record_failure(item, reason);
                return Ok(());
            }
        };
        match store.insert(&triple)? {
            InsertOutcome::Inserted => self.inserted += 1,
            InsertOutcome::AlreadyPresent => self.already_present += 1,
            InsertOutcome::Rejected(reason) => {
                self.record_failure(item, FailureReason::Rejected(reason));
            }
        }
        Ok(())
    }
}

fn convert<S: AsRef<str>>(raw: &[S; 3]) -> Result<Triple, FailureReason> {
    let parse = |position: Position| {
        parse_term(raw[position.index()].as_ref())
            .map_err(|error| FailureReason::InvalidTerm { position, error })
    };
    Ok(Triple::new(
        parse(Position::Subject)?,
        parse(Position::Predicate)?,
        parse(Position::Object)?,
    ))
}

/// Import raw `[subject, predicate, object]` triples.
///
/// Conversion failures and rejected triples are recorded in the report. Store
/// errors end the import, since every later insert would fail the same way.
pub fn import<I, S>(store: &TripleStore, raw_triples: I) -> Result<ImportReport, StoreError>
where
    I: IntoIterator<Item = [S; 3]>,
    S: AsRef<str>,
{
    let mut report = ImportReport::default();
    for (item, raw) in raw_triples.into_iter().enumerate() {
        report.import_one(store, item, &raw)?;
    }
    tracing::debug!(
        "imported into '{}': {} inserted, {} already present, {} failed",
        store.name(),
        report.inserted,
        report.already_present,
        report.failures.len()
    );
    Ok(report)
}

/// Import a tab-separated triple file.
pub fn import_file(store: &TripleStore, path: &Path) -> Result<ImportReport, ImportError> {
    let contents = std::fs::read_to_string(path)?;
    let mut report = ImportReport::default();

    for (index, line) in contents.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let Ok(raw) = <[&str; 3]>::try_from(fields.as_slice()) else {
            report.record_failure(
                line_number,
                FailureReason::MalformedLine {
                    fields: fields.len(),
                },
            );
            continue;
        };
        report.import_one(store, line_number, &raw)?;
    }

    tracing::debug!(
        "imported {} into '{}': {} inserted, {} already present, {} failed",
        path.display(),
        store.name(),
        report.inserted,
        report.already_present,
        report.failures.len()
    );
    Ok(report)
}

/// Errors that end a file import.
#[derive(Debug)]
pub enum ImportError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The store failed.
    Store(StoreError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StoreError> for ImportError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
