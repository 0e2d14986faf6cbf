//! Execution context for search operators
//!
//! The `ExecutionContext` carries what operators need while running: the
//! process-wide configuration, the adapter registry (and with it the pooled
//! HTTP client), the enclosing query's cancel token, and the result
//! metadata sink.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::adapter::AdapterRegistry;
use crate::config::FtsConfig;
use crate::deadline::CancelToken;
use crate::error::Result;

/// Execution context shared by the operators of one query
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub config: Arc<FtsConfig>,
    pub adapters: Arc<AdapterRegistry>,
    /// Fires when the enclosing query is aborted
    pub cancel: CancelToken,
    pub metadata: Arc<ResultMetadata>,
}

impl ExecutionContext {
    /// Context with the built-in adapters for `config`
    pub fn new(config: FtsConfig) -> Result<Self> {
        let adapters = AdapterRegistry::from_config(&config)?;
        Ok(Self::with_adapters(config, adapters))
    }

    /// Context over the process-wide configuration
    pub fn from_global() -> Result<Self> {
        Self::new(FtsConfig::global()?.clone())
    }

    pub fn with_adapters(config: FtsConfig, adapters: AdapterRegistry) -> Self {
        Self {
            config: Arc::new(config),
            adapters: Arc::new(adapters),
            cancel: CancelToken::never(),
            metadata: Arc::new(ResultMetadata::default()),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Non-fatal conditions reported alongside query results
#[derive(Debug, Clone, PartialEq)]
pub enum QueryWarning {
    /// A search call's deadline expired after hits had begun streaming
    PartialResults {
        /// Subject variable of the truncated call
        subject: String,
        /// Rows delivered before truncation
        rows: usize,
        elapsed: Duration,
    },
    /// The endpoint itself reported a truncated result list
    EndpointPartial { subject: String },
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryWarning::PartialResults {
                subject,
                rows,
                elapsed,
            } => write!(
                f,
                "fts search for {subject} timed out after {elapsed:?}; returned {rows} partial rows"
            ),
            QueryWarning::EndpointPartial { subject } => {
                write!(f, "search endpoint returned partial results for {subject}")
            }
        }
    }
}

/// Result metadata collected while a query runs
#[derive(Debug, Default)]
pub struct ResultMetadata {
    warnings: Mutex<Vec<QueryWarning>>,
}

impl ResultMetadata {
    pub fn push_warning(&self, warning: QueryWarning) {
        self.warnings.lock().push(warning);
    }

    pub fn warnings(&self) -> Vec<QueryWarning> {
        self.warnings.lock().clone()
    }

    /// True if any call returned fewer results than the endpoint had
    pub fn is_partial(&self) -> bool {
        !self.warnings.lock().is_empty()
    }
}
