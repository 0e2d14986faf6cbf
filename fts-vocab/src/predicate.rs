//! Typed predicate symbols for the fts namespace.

use std::fmt;

use crate::{fts, fts_names};

/// A recognized predicate in the fts namespace.
///
/// Predicate IRIs are case-sensitive: `fts:Search` is not `fts:search` and
/// is rejected as an unknown predicate by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FtsPredicate {
    Search,
    Endpoint,
    EndpointType,
    Params,
    TargetType,
    Timeout,
    Score,
    Snippet,
}

impl FtsPredicate {
    /// Every predicate in the registry, in documentation order.
    pub const ALL: [FtsPredicate; 8] = [
        FtsPredicate::Search,
        FtsPredicate::Endpoint,
        FtsPredicate::EndpointType,
        FtsPredicate::Params,
        FtsPredicate::TargetType,
        FtsPredicate::Timeout,
        FtsPredicate::Score,
        FtsPredicate::Snippet,
    ];

    /// Full IRI of the predicate.
    pub fn iri(self) -> &'static str {
        match self {
            FtsPredicate::Search => fts::SEARCH,
            FtsPredicate::Endpoint => fts::ENDPOINT,
            FtsPredicate::EndpointType => fts::ENDPOINT_TYPE,
            FtsPredicate::Params => fts::PARAMS,
            FtsPredicate::TargetType => fts::TARGET_TYPE,
            FtsPredicate::Timeout => fts::TIMEOUT,
            FtsPredicate::Score => fts::SCORE,
            FtsPredicate::Snippet => fts::SNIPPET,
        }
    }

    /// Local name within the namespace.
    pub fn local_name(self) -> &'static str {
        match self {
            FtsPredicate::Search => fts_names::SEARCH,
            FtsPredicate::Endpoint => fts_names::ENDPOINT,
            FtsPredicate::EndpointType => fts_names::ENDPOINT_TYPE,
            FtsPredicate::Params => fts_names::PARAMS,
            FtsPredicate::TargetType => fts_names::TARGET_TYPE,
            FtsPredicate::Timeout => fts_names::TIMEOUT,
            FtsPredicate::Score => fts_names::SCORE,
            FtsPredicate::Snippet => fts_names::SNIPPET,
        }
    }

    /// Look up a predicate by local name (case-sensitive).
    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.local_name() == name)
    }

    /// Look up a predicate by full IRI (case-sensitive).
    ///
    /// Returns `None` both for IRIs outside the namespace and for unknown
    /// local names inside it; use [`fts::is_fts_iri`] to tell them apart.
    pub fn from_iri(iri: &str) -> Option<Self> {
        iri.strip_prefix(fts::NAMESPACE)
            .and_then(Self::from_local_name)
    }

    /// Whether the object of this predicate is an output variable.
    pub fn is_output(self) -> bool {
        matches!(self, FtsPredicate::Score | FtsPredicate::Snippet)
    }
}

impl fmt::Display for FtsPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", fts::PREFIX, self.local_name())
    }
}
