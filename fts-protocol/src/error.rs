//! Protocol-level errors.

use thiserror::Error;

/// Errors building requests or decoding responses
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A `params` string could not be read as an urlencoded query string.
    #[error("invalid params segment '{segment}': {reason}")]
    InvalidParams { segment: String, reason: String },

    /// A document, header or highlighting section was not valid JSON.
    #[error("malformed {section}: {source}")]
    MalformedSection {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The body does not have the shape of a select response.
    #[error("unexpected response structure: {0}")]
    UnexpectedStructure(String),

    /// The body ended before the top-level JSON object was closed.
    #[error("response body truncated")]
    Truncated,
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
