//! RDF term model.
//!
//! A `Term` is a resolved RDF value: an IRI, a blank node, or a literal.
//! Terms are immutable and compared structurally. String payloads are held
//! in `Arc<str>` so that copies handed out by cursors share storage with the
//! dictionary.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// The kind of a term, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Iri,
    BlankNode,
    Literal,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri => write!(f, "IRI"),
            Self::BlankNode => write!(f, "blank node"),
            Self::Literal => write!(f, "literal"),
        }
    }
}

/// A literal value with an optional language tag and optional datatype IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Literal {
    /// The lexical form.
    pub value: Arc<str>,
    /// Language tag, e.g. `en`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Arc<str>>,
    /// Datatype IRI, e.g. `http://www.w3.org/2001/XMLSchema#integer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Arc<str>>,
}

impl Literal {
    /// Create a plain literal.
    #[must_use]
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }
}

/// A resolved RDF value.
///
/// # Invariants
///
/// - Two terms are equal iff their kinds and all sub-fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Term {
    /// An IRI.
    Iri(Arc<str>),
    /// A blank node, identified by its label (without the `_:` prefix).
    BlankNode(Arc<str>),
    /// A literal.
    Literal(Literal),
}

impl Term {
    /// Create an IRI term.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdfstore::types::Term;
    /// let t = Term::iri("http://example.org/a");
    /// assert!(t.is_node());
    /// ```
    #[must_use]
    pub fn iri(iri: impl Into<Arc<str>>) -> Self {
        Self::Iri(iri.into())
    }

    /// Create a blank node term.
    #[must_use]
    pub fn blank(label: impl Into<Arc<str>>) -> Self {
        Self::BlankNode(label.into())
    }

    /// Create a plain literal term.
    #[must_use]
    pub fn literal(value: impl Into<Arc<str>>) -> Self {
        Self::Literal(Literal::new(value))
    }

    /// Create a language-tagged literal term.
    #[must_use]
    pub fn lang_literal(value: impl Into<Arc<str>>, language: impl Into<Arc<str>>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        })
    }

    /// Create a typed literal term.
    #[must_use]
    pub fn typed_literal(value: impl Into<Arc<str>>, datatype: impl Into<Arc<str>>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        })
    }

    /// Get the kind of this term.
    #[must_use]
    pub const fn kind(&self) -> TermKind {
        match self {
            Self::Iri(_) => TermKind::Iri,
            Self::BlankNode(_) => TermKind::BlankNode,
            Self::Literal(_) => TermKind::Literal,
        }
    }

    /// Check whether this term may appear in subject or predicate position.
    #[must_use]
    pub const fn is_node(&self) -> bool {
        matches!(self, Self::Iri(_) | Self::BlankNode(_))
    }

    /// The lexical value: the IRI, the blank node label, or the literal's
    /// lexical form.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Iri(s) | Self::BlankNode(s) => s,
            Self::Literal(lit) => &lit.value,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(label) => write!(f, "_:{label}"),
            Self::Literal(lit) => {
                write!(f, "\"{}\"", lit.value)?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{lang}")?;
                }
                if let Some(datatype) = &lit.datatype {
                    write!(f, "^^<{datatype}>")?;
                }
                Ok(())
            }
        }
    }
}
