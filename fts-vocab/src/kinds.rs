//! Enum values accepted as literals in fts queries.
//!
//! Literal values are matched case-insensitively (`"Solr"`, `"SOLR"` and
//! `"solr"` all name [`EndpointKind::Solr`]); the canonical spelling is the
//! upper-case name, which is what `Display` and serde produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing vocabulary enum literals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabError {
    #[error("unknown endpoint type '{0}' (expected SOLR)")]
    UnknownEndpointKind(String),

    #[error("unknown target type '{0}' (expected URI or LITERAL)")]
    UnknownTargetKind(String),
}

/// Kind of external full-text search service.
///
/// Only Solr is implemented; new services are added here and registered
/// with an adapter in the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndpointKind {
    #[default]
    #[serde(rename = "SOLR", alias = "solr", alias = "Solr")]
    Solr,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 1] = [EndpointKind::Solr];

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointKind::Solr => "SOLR",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| VocabError::UnknownEndpointKind(s.to_string()))
    }
}

/// How a hit identifier is turned into a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetKind {
    /// Parse the identifier as an IRI; hits that fail to parse are dropped.
    #[default]
    #[serde(rename = "URI", alias = "uri")]
    Uri,
    /// Bind the identifier verbatim as a plain literal.
    #[serde(rename = "LITERAL", alias = "literal")]
    Literal,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Uri, TargetKind::Literal];

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Uri => "URI",
            TargetKind::Literal => "LITERAL",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| VocabError::UnknownTargetKind(s.to_string()))
    }
}
