//! Query patterns.
//!
//! - `Pattern` - a triple with each position either bound to a term or open
//! - `Variable` - a named placeholder
//! - `PatternElement` - a term or a variable
//! - `QueryPattern` - a triple of pattern elements, as supplied by a query engine

use std::fmt;

use crate::types::{Position, Term, Triple};

/// A triple pattern: `None` positions match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
}

impl Pattern {
    /// Create a new pattern.
    #[must_use]
    pub const fn new(subject: Option<Term>, predicate: Option<Term>, object: Option<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// A pattern matching every triple.
    #[must_use]
    pub const fn any() -> Self {
        Self::new(None, None, None)
    }

    /// A pattern matching exactly one triple.
    #[must_use]
    pub fn exact(triple: &Triple) -> Self {
        Self::new(
            Some(triple.subject.clone()),
            Some(triple.predicate.clone()),
            Some(triple.object.clone()),
        )
    }

    /// Get the bound term at a position.
    #[must_use]
    pub const fn get(&self, position: Position) -> Option<&Term> {
        match position {
            Position::Subject => self.subject.as_ref(),
            Position::Predicate => self.predicate.as_ref(),
            Position::Object => self.object.as_ref(),
        }
    }

    /// Check if a position is bound.
    #[must_use]
    pub const fn is_bound(&self, position: Position) -> bool {
        self.get(position).is_some()
    }

    /// Number of bound positions.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        Position::ALL
            .iter()
            .filter(|position| self.is_bound(**position))
            .count()
    }

    /// Check if a triple agrees with every bound position.
    #[must_use]
    pub fn matches(&self, triple: &Triple) -> bool {
        Position::ALL.iter().all(|position| {
            self.get(*position)
                .is_none_or(|term| term == triple.get(*position))
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for position in Position::ALL {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            match self.get(position) {
                Some(term) => write!(f, "{term}")?,
                None => write!(f, "_")?,
            }
        }
        Ok(())
    }
}

/// A query variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    /// The variable name.
    pub name: String,
}

impl Variable {
    /// Create a new variable.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// A pattern element - either a concrete term or a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    /// A concrete term.
    Term(Term),
    /// A variable to be bound.
    Variable(Variable),
}

impl PatternElement {
    /// Create a variable pattern element.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(Variable::new(name))
    }

    /// Create a term pattern element.
    #[must_use]
    pub const fn term(term: Term) -> Self {
        Self::Term(term)
    }

    /// Get the variable, if this element is one.
    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(v) => Some(v),
            Self::Term(_) => None,
        }
    }

    /// Get the term, if this element is one.
    #[must_use]
    pub const fn as_term(&self) -> Option<&Term> {
        match self {
            Self::Term(t) => Some(t),
            Self::Variable(_) => None,
        }
    }
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(t) => write!(f, "{t}"),
            Self::Variable(v) => write!(f, "{v}"),
        }
    }
}

/// A triple pattern with named variables.
///
/// The same variable may appear in more than one position; matching triples
/// must then hold equal terms there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPattern {
    pub subject: PatternElement,
    pub predicate: PatternElement,
    pub object: PatternElement,
}

impl QueryPattern {
    /// Create a new query pattern.
    #[must_use]
    pub const fn new(
        subject: PatternElement,
        predicate: PatternElement,
        object: PatternElement,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Get the element at a position.
    #[must_use]
    pub const fn get(&self, position: Position) -> &PatternElement {
        match position {
            Position::Subject => &self.subject,
            Position::Predicate => &self.predicate,
            Position::Object => &self.object,
        }
    }

    /// The store-level pattern: terms stay bound, variables become open.
    #[must_use]
    pub fn to_pattern(&self) -> Pattern {
        Pattern::new(
            self.subject.as_term().cloned(),
            self.predicate.as_term().cloned(),
            self.object.as_term().cloned(),
        )
    }
}

impl fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.subject, self.predicate, self.object)
    }
}
