//! Wire protocol types for external full-text search endpoints.
//!
//! This crate defines the contract between the query engine and an external
//! ranked search service. It has no HTTP dependency; the engine's endpoint
//! adapters use these types to build requests and decode responses.
//!
//! - [`SelectRequest`] / [`SolrParams`]: the `select` query string
//! - [`DocScanner`]: incremental decoder for a streamed JSON response body
//! - [`FieldMapping`] / [`hits_from_doc`]: document → [`SearchHit`] extraction
//! - [`SolrErrorBody`]: error envelope returned with non-2xx statuses
//!
//! # Example
//!
//! ```rust
//! use fts_protocol::{SelectRequest, SolrParams};
//!
//! let params = SolrParams::parse("defType=dismax&bf=uses%5E50").unwrap();
//! let request = SelectRequest::new("blue !red").with_params(params);
//! let query = request.query_string();
//! assert!(query.starts_with("q=blue%20%21red&defType=dismax"));
//! assert!(query.ends_with("wt=json"));
//! ```

mod error;
mod hit;
mod request;
mod response;
mod scanner;

pub use error::{ProtocolError, Result};
pub use hit::SearchHit;
pub use request::{select_url, SelectRequest, SolrParams};
pub use response::{
    doc_key, hits_from_doc, FieldMapping, Highlighting, ResponseHeader, SolrErrorBody,
    SolrErrorDetail,
};
pub use scanner::{DocScanner, ScanEvent};

/// Request handler appended to a Solr core URL.
pub const SELECT_HANDLER: &str = "select";

/// Response writer parameter name and the only value the decoder accepts.
pub const WT_PARAM: &str = "wt";
pub const WT_JSON: &str = "json";

/// Solr's native time budget parameter (milliseconds).
pub const TIME_ALLOWED_PARAM: &str = "timeAllowed";

/// Default document field holding the hit identifier.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default document field holding the relevance score.
pub const DEFAULT_SCORE_FIELD: &str = "score";

/// Default inline document field holding a snippet.
pub const DEFAULT_SNIPPET_FIELD: &str = "snippet";
