//! Endpoint adapters
//!
//! An adapter turns a [`SearchCall`] into one request against an external
//! service and exposes the answer as a pull-based [`HitStream`]. Adapters
//! are looked up by [`EndpointKind`] in an [`AdapterRegistry`].

mod solr;

pub use solr::{SolrAdapter, SolrHitStream};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fts_protocol::SearchHit;
use fts_vocab::EndpointKind;
use reqwest::{Client, Url};

use crate::call::SearchCall;
use crate::config::FtsConfig;
use crate::error::{FtsError, Result};

/// One request to dispatch
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub call: &'a SearchCall,
    /// Resolved service URL (the call's endpoint or the configured default)
    pub endpoint: &'a Url,
    /// Time left on the call's deadline, `None` when unbounded
    pub timeout: Option<Duration>,
}

/// Adapter for one kind of search endpoint
#[async_trait]
pub trait EndpointAdapter: fmt::Debug + Send + Sync {
    fn kind(&self) -> EndpointKind;

    /// Send the request. Resolves once the endpoint has answered with a
    /// success status; the body is consumed through the returned stream.
    async fn dispatch(&self, request: DispatchRequest<'_>) -> Result<BoxedHitStream>;
}

/// Lazy, finite, non-restartable sequence of hits in endpoint order
#[async_trait]
pub trait HitStream: Send {
    /// Next hit, or `None` at end of stream
    async fn next_hit(&mut self) -> Result<Option<SearchHit>>;

    /// True when the endpoint itself reported a truncated result list
    fn endpoint_partial(&self) -> bool {
        false
    }

    /// Hits already decoded but not yet yielded, handed over when the
    /// deadline ends the stream. The stream is not polled afterwards.
    fn take_buffered(&mut self) -> Vec<SearchHit> {
        Vec::new()
    }
}

pub type BoxedHitStream = Box<dyn HitStream>;

/// Endpoint kind → adapter
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<EndpointKind, Arc<dyn EndpointAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter, sharing one pooled client
    pub fn from_config(config: &FtsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| FtsError::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::new().with(SolrAdapter::new(client, config.solr.clone())))
    }

    pub fn with(mut self, adapter: impl EndpointAdapter + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    /// Register an adapter, replacing any previous one for its kind
    pub fn register(&mut self, adapter: Arc<dyn EndpointAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: EndpointKind) -> Result<Arc<dyn EndpointAdapter>> {
        self.adapters
            .get(&kind)
            .cloned()
            .ok_or_else(|| FtsError::UnknownEndpointType(kind.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = EndpointKind> + '_ {
        self.adapters.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_registers_solr() {
        let registry = AdapterRegistry::from_config(&FtsConfig::default()).unwrap();
        let adapter = registry.get(EndpointKind::Solr).unwrap();
        assert_eq!(adapter.kind(), EndpointKind::Solr);
        assert_eq!(registry.kinds().count(), 1);
    }

    #[test]
    fn test_missing_registration() {
        let registry = AdapterRegistry::new();
        let err = registry.get(EndpointKind::Solr).unwrap_err();
        assert!(matches!(err, FtsError::UnknownEndpointType(ref k) if k == "SOLR"));
    }
}
