//! RDF Vocabulary Constants for the External Full-Text Search Predicates
//!
//! This crate is the read-only registry for the "magic" predicates that
//! expose an external full-text search service inside SPARQL.
//!
//! # Organization
//!
//! - `fts` - namespace, SERVICE IRI, predicate local names and IRIs
//!   (http://www.bigdata.com/rdf/fts#)
//! - [`FtsPredicate`] - typed predicate symbols with IRI lookup
//! - [`EndpointKind`] / [`TargetKind`] - enum values accepted in query literals
//! - `xsd` / `rdf` - datatype IRIs used when binding results
//!
//! # Example
//!
//! ```rust
//! use fts_vocab::{fts, FtsPredicate, TargetKind};
//!
//! let p = FtsPredicate::from_iri("http://www.bigdata.com/rdf/fts#score");
//! assert_eq!(p, Some(FtsPredicate::Score));
//! assert_eq!(fts::SERVICE_IRI, "http://www.bigdata.com/rdf/fts#search");
//! assert_eq!("literal".parse::<TargetKind>().unwrap(), TargetKind::Literal);
//! ```

mod kinds;
mod predicate;

pub use kinds::{EndpointKind, TargetKind, VocabError};
pub use predicate::FtsPredicate;

/// External full-text search vocabulary
pub mod fts {
    /// The namespace used for the magic search predicates
    pub const NAMESPACE: &str = "http://www.bigdata.com/rdf/fts#";

    /// Conventional prefix used in examples and CLI output
    pub const PREFIX: &str = "fts";

    /// SERVICE IRI delimiting the patterns of one search call
    ///
    /// Same IRI as the `search` predicate.
    pub const SERVICE_IRI: &str = "http://www.bigdata.com/rdf/fts#search";

    /// fts:search IRI
    pub const SEARCH: &str = "http://www.bigdata.com/rdf/fts#search";

    /// fts:endpoint IRI
    pub const ENDPOINT: &str = "http://www.bigdata.com/rdf/fts#endpoint";

    /// fts:endpointType IRI
    pub const ENDPOINT_TYPE: &str = "http://www.bigdata.com/rdf/fts#endpointType";

    /// fts:params IRI
    pub const PARAMS: &str = "http://www.bigdata.com/rdf/fts#params";

    /// fts:targetType IRI
    pub const TARGET_TYPE: &str = "http://www.bigdata.com/rdf/fts#targetType";

    /// fts:timeout IRI
    pub const TIMEOUT: &str = "http://www.bigdata.com/rdf/fts#timeout";

    /// fts:score IRI
    pub const SCORE: &str = "http://www.bigdata.com/rdf/fts#score";

    /// fts:snippet IRI
    pub const SNIPPET: &str = "http://www.bigdata.com/rdf/fts#snippet";

    /// Check whether an IRI lies in the fts namespace
    #[inline]
    pub fn is_fts_iri(iri: &str) -> bool {
        iri.starts_with(NAMESPACE)
    }
}

/// FTS predicate local names
pub mod fts_names {
    /// fts:search - the query string sent to the endpoint
    pub const SEARCH: &str = "search";

    /// fts:endpoint - endpoint URL overriding the process default
    pub const ENDPOINT: &str = "endpoint";

    /// fts:endpointType - kind of external service
    pub const ENDPOINT_TYPE: &str = "endpointType";

    /// fts:params - endpoint-native query parameters
    pub const PARAMS: &str = "params";

    /// fts:targetType - URI or LITERAL coercion of hit identifiers
    pub const TARGET_TYPE: &str = "targetType";

    /// fts:timeout - deadline in milliseconds
    pub const TIMEOUT: &str = "timeout";

    /// fts:score - output variable for the hit score
    pub const SCORE: &str = "score";

    /// fts:snippet - output variable for the hit snippet
    pub const SNIPPET: &str = "snippet";
}

/// FTS defaults
pub mod defaults {
    use crate::{EndpointKind, TargetKind};

    /// Endpoint kind used when `fts:endpointType` is absent
    pub const ENDPOINT_KIND: EndpointKind = EndpointKind::Solr;

    /// Target kind used when `fts:targetType` is absent or unrecognized
    pub const TARGET_KIND: TargetKind = TargetKind::Uri;

    /// Timeout used when `fts:timeout` is absent or invalid: unbounded
    pub const TIMEOUT_MS: Option<u64> = None;
}

/// XSD vocabulary constants
pub mod xsd {
    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:long IRI
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";

    /// xsd:int IRI
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";

    /// xsd:short IRI
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";

    /// xsd:unsignedLong IRI
    pub const UNSIGNED_LONG: &str = "http://www.w3.org/2001/XMLSchema#unsignedLong";

    /// xsd:unsignedInt IRI
    pub const UNSIGNED_INT: &str = "http://www.w3.org/2001/XMLSchema#unsignedInt";

    /// xsd:nonNegativeInteger IRI
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";

    /// xsd:positiveInteger IRI
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";

    /// xsd:double IRI
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

    /// xsd:float IRI
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";

    /// Check whether a datatype belongs to the integer family accepted
    /// for `fts:timeout`
    #[inline]
    pub fn is_integer_family(datatype_iri: &str) -> bool {
        matches!(
            datatype_iri,
            INTEGER
                | LONG
                | INT
                | SHORT
                | UNSIGNED_LONG
                | UNSIGNED_INT
                | NON_NEGATIVE_INTEGER
                | POSITIVE_INTEGER
        )
    }
}

/// RDF vocabulary constants
pub mod rdf {
    /// rdf:langString IRI
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_iris_share_namespace() {
        for iri in [
            fts::SEARCH,
            fts::ENDPOINT,
            fts::ENDPOINT_TYPE,
            fts::PARAMS,
            fts::TARGET_TYPE,
            fts::TIMEOUT,
            fts::SCORE,
            fts::SNIPPET,
        ] {
            assert!(fts::is_fts_iri(iri), "{iri} outside namespace");
        }
    }

    #[test]
    fn test_service_iri_is_search_predicate() {
        assert_eq!(fts::SERVICE_IRI, fts::SEARCH);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(defaults::ENDPOINT_KIND, EndpointKind::Solr);
        assert_eq!(defaults::TARGET_KIND, TargetKind::Uri);
        assert!(defaults::TIMEOUT_MS.is_none());
    }

    #[test]
    fn test_integer_family() {
        assert!(xsd::is_integer_family(xsd::INTEGER));
        assert!(xsd::is_integer_family(xsd::NON_NEGATIVE_INTEGER));
        assert!(!xsd::is_integer_family(xsd::DOUBLE));
        assert!(!xsd::is_integer_family(xsd::STRING));
    }
}
