//! Logical pattern IR handed to and returned by the planner
//!
//! Each `Vec<Pattern>` is one lexical scope (a group graph pattern).
//! Planning rewrites fts triples and fts SERVICE blocks into
//! [`Pattern::Search`] and leaves everything else untouched.

use std::sync::Arc;

use crate::call::SearchCall;
use crate::pattern::TriplePattern;
use crate::var_registry::VarId;

/// Endpoint of a SERVICE clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEndpoint {
    Iri(Arc<str>),
    Var(VarId),
}

/// `SERVICE [SILENT] <endpoint> { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePattern {
    pub silent: bool,
    pub endpoint: ServiceEndpoint,
    pub patterns: Vec<Pattern>,
}

impl ServicePattern {
    pub fn new(silent: bool, endpoint: ServiceEndpoint, patterns: Vec<Pattern>) -> Self {
        Self {
            silent,
            endpoint,
            patterns,
        }
    }

    pub fn endpoint_iri(&self) -> Option<&str> {
        match &self.endpoint {
            ServiceEndpoint::Iri(iri) => Some(iri),
            ServiceEndpoint::Var(_) => None,
        }
    }

    pub fn variables(&self) -> Vec<VarId> {
        let mut vars: Vec<VarId> = self.patterns.iter().flat_map(|p| p.variables()).collect();
        if let ServiceEndpoint::Var(v) = &self.endpoint {
            vars.push(*v);
        }
        vars
    }
}

/// Logical pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Triple(TriplePattern),

    /// Nested group `{ ... }`; its own scope
    Group(Vec<Pattern>),

    /// `OPTIONAL { ... }`; its own scope
    Optional(Vec<Pattern>),

    Service(ServicePattern),

    /// Planned external search call
    Search(SearchCall),
}

impl Pattern {
    /// All variables referenced by this pattern, including nested scopes
    pub fn variables(&self) -> Vec<VarId> {
        match self {
            Pattern::Triple(tp) => tp.variables(),
            Pattern::Group(inner) | Pattern::Optional(inner) => {
                inner.iter().flat_map(|p| p.variables()).collect()
            }
            Pattern::Service(sp) => sp.variables(),
            Pattern::Search(call) => call.output_vars(),
        }
    }

    pub fn as_search(&self) -> Option<&SearchCall> {
        match self {
            Pattern::Search(call) => Some(call),
            _ => None,
        }
    }
}
