//! Error types for planning and evaluating search calls

use std::time::Duration;

use fts_protocol::ProtocolError;
use thiserror::Error;

/// Search operator errors
///
/// Every variant is fatal for the enclosing query. Deadline expiry after
/// the first hit is not an error: the operator ends the stream and flags
/// partial results instead.
#[derive(Error, Debug)]
pub enum FtsError {
    /// Unknown predicate in the fts namespace, cardinality violation, or an
    /// object of the wrong kind
    #[error("Invalid fts vocabulary: {0}")]
    InvalidVocabulary(String),

    /// A subject group has no fts:search pattern
    #[error("Missing fts:search for subject {subject}")]
    MissingSearch { subject: String },

    /// A subject group has more than one fts:search pattern
    #[error("Duplicate fts:search for subject {subject}")]
    DuplicateSearch { subject: String },

    /// The subject of fts:search is a constant or is already bound
    #[error("Subject {subject} of fts:search must be an unbound variable")]
    BoundSubject { subject: String },

    /// fts:endpoint is not an absolute http(s) URL, or no endpoint is known
    #[error("Bad fts:endpoint '{endpoint}': {reason}")]
    BadEndpoint { endpoint: String, reason: String },

    /// fts:endpointType names no known endpoint kind, or no adapter is
    /// registered for it
    #[error("Unknown fts:endpointType '{0}'")]
    UnknownEndpointType(String),

    /// fts:params cannot be read as endpoint-native parameters
    #[error("Bad fts:params: {0}")]
    BadParams(String),

    /// Invalid process-wide configuration value
    #[error("Bad configuration value for {key}: {reason}")]
    BadConfig { key: &'static str, reason: String },

    /// Network, DNS or TLS failure
    #[error("Search endpoint unreachable: {0}")]
    EndpointUnreachable(String),

    /// The endpoint answered with an error status
    #[error("Search endpoint rejected the request ({status}): {message}")]
    EndpointRejected { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Malformed search response: {0}")]
    MalformedResponse(String),

    /// The deadline expired before any hit was received
    #[error("Search timed out after {elapsed:?} before the first hit")]
    Timeout { elapsed: Duration },

    /// The enclosing query aborted the operator
    #[error("Search cancelled")]
    Cancelled,

    /// Operator not opened
    #[error("Operator not opened - call open() before next()")]
    OperatorNotOpened,

    /// Operator already opened
    #[error("Operator already opened")]
    OperatorAlreadyOpened,

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure classes reported to the enclosing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rejected before any endpoint was contacted
    Validation,
    /// The endpoint could not be reached, refused, or answered garbage
    Endpoint,
    Timeout,
    Cancelled,
    Internal,
}

impl FtsError {
    pub fn class(&self) -> FailureClass {
        match self {
            FtsError::InvalidVocabulary(_)
            | FtsError::MissingSearch { .. }
            | FtsError::DuplicateSearch { .. }
            | FtsError::BoundSubject { .. }
            | FtsError::BadEndpoint { .. }
            | FtsError::UnknownEndpointType(_)
            | FtsError::BadParams(_)
            | FtsError::BadConfig { .. } => FailureClass::Validation,
            FtsError::EndpointUnreachable(_)
            | FtsError::EndpointRejected { .. }
            | FtsError::MalformedResponse(_) => FailureClass::Endpoint,
            FtsError::Timeout { .. } => FailureClass::Timeout,
            FtsError::Cancelled => FailureClass::Cancelled,
            FtsError::OperatorNotOpened
            | FtsError::OperatorAlreadyOpened
            | FtsError::Internal(_) => FailureClass::Internal,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.class() == FailureClass::Validation
    }

    /// Whether the error aborts the enclosing query. Always true: a
    /// truncated stream ends with `Ok(None)` and never surfaces here.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl From<ProtocolError> for FtsError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::InvalidParams { .. } => FtsError::BadParams(e.to_string()),
            other => FtsError::MalformedResponse(other.to_string()),
        }
    }
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, FtsError>;
