//! Terms and triple patterns
//!
//! The engine hands the planner patterns whose constants are still plain
//! IRIs and lexical literals; nothing here is dictionary-encoded.

use std::fmt;
use std::sync::Arc;

use fts_vocab::{rdf, xsd};

use crate::var_registry::VarId;

/// An RDF literal as written in the query
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub lexical: Arc<str>,
    /// Datatype IRI; `None` for a simple literal
    pub datatype: Option<Arc<str>>,
    /// Language tag; implies `rdf:langString`
    pub lang: Option<Arc<str>>,
}

impl Literal {
    /// Simple literal (`"text"`)
    pub fn plain(lexical: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Typed literal (`"5"^^xsd:integer`)
    pub fn typed(lexical: impl Into<Arc<str>>, datatype: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            lang: None,
        }
    }

    /// Language-tagged literal (`"text"@en`)
    pub fn lang(lexical: impl Into<Arc<str>>, tag: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            lang: Some(tag.into()),
        }
    }

    /// Effective datatype IRI
    pub fn datatype_iri(&self) -> &str {
        match (&self.datatype, &self.lang) {
            (Some(dt), _) => dt,
            (None, Some(_)) => rdf::LANG_STRING,
            (None, None) => xsd::STRING,
        }
    }

    /// True for simple, `xsd:string` and language-tagged literals
    pub fn is_string(&self) -> bool {
        matches!(self.datatype_iri(), xsd::STRING | rdf::LANG_STRING)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lexical.as_ref())?;
        if let Some(lang) = &self.lang {
            write!(f, "@{lang}")
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{dt}>")
        } else {
            Ok(())
        }
    }
}

/// A term in a triple pattern: variable, IRI or literal
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(VarId),
    Iri(Arc<str>),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<Arc<str>>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Term::Var(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "?_{}", v.0),
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

/// A triple pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriplePattern {
    pub s: Term,
    pub p: Term,
    pub o: Term,
}

impl TriplePattern {
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Self { s, p, o }
    }

    /// Predicate IRI, if the predicate is a constant
    pub fn predicate_iri(&self) -> Option<&str> {
        self.p.as_iri()
    }

    /// Variables referenced by this pattern, in s/p/o order
    pub fn variables(&self) -> Vec<VarId> {
        [&self.s, &self.p, &self.o]
            .into_iter()
            .filter_map(Term::as_var)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_datatypes() {
        assert!(Literal::plain("blue").is_string());
        assert!(Literal::lang("blau", "de").is_string());
        assert!(Literal::typed("blue", xsd::STRING).is_string());
        assert!(!Literal::typed("5", xsd::INTEGER).is_string());
        assert_eq!(Literal::lang("x", "en").datatype_iri(), rdf::LANG_STRING);
    }

    #[test]
    fn test_triple_variables() {
        let tp = TriplePattern::new(
            Term::Var(VarId(0)),
            Term::iri("http://example.org/p"),
            Term::Var(VarId(1)),
        );
        assert_eq!(tp.variables(), vec![VarId(0), VarId(1)]);
        assert_eq!(tp.predicate_iri(), Some("http://example.org/p"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Literal::typed("5", xsd::INTEGER).to_string(),
            format!("\"5\"^^<{}>", xsd::INTEGER)
        );
        assert_eq!(Literal::lang("x", "en").to_string(), "\"x\"@en");
        assert_eq!(Term::iri("http://a").to_string(), "<http://a>");
    }
}
