//! The validated description of one external search invocation

use std::time::Duration;

use fts_vocab::{defaults, EndpointKind, TargetKind};
use reqwest::Url;

use crate::var_registry::VarId;

/// One external search call, produced by the planner.
///
/// # Invariants
///
/// - `subject` is distinct from `score_var` and `snippet_var`
/// - `score_var` and `snippet_var` are distinct when both are present
/// - `endpoint`, when present, is an absolute http(s) URL with a host
/// - `params` has already been checked against `endpoint_kind`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    /// Variable receiving each hit's identifier
    pub subject: VarId,

    /// Search string, forwarded verbatim
    pub query: String,

    /// Service URL; `None` falls back to the configured default
    pub endpoint: Option<Url>,

    pub endpoint_kind: EndpointKind,

    /// Opaque endpoint-native parameters
    pub params: Option<String>,

    pub target: TargetKind,

    /// Deadline in milliseconds; `None` falls back to the configured
    /// default, and to unbounded after that
    pub timeout_ms: Option<u64>,

    pub score_var: Option<VarId>,

    pub snippet_var: Option<VarId>,
}

impl SearchCall {
    /// Create a call with every optional setting at its default
    pub fn new(subject: VarId, query: impl Into<String>) -> Self {
        Self {
            subject,
            query: query.into(),
            endpoint: None,
            endpoint_kind: defaults::ENDPOINT_KIND,
            params: None,
            target: defaults::TARGET_KIND,
            timeout_ms: defaults::TIMEOUT_MS,
            score_var: None,
            snippet_var: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_endpoint_kind(mut self, kind: EndpointKind) -> Self {
        self.endpoint_kind = kind;
        self
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn with_target(mut self, target: TargetKind) -> Self {
        self.target = target;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_score_var(mut self, var: VarId) -> Self {
        self.score_var = Some(var);
        self
    }

    pub fn with_snippet_var(mut self, var: VarId) -> Self {
        self.snippet_var = Some(var);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Variables this call binds, in output column order: subject, then
    /// score, then snippet
    pub fn output_vars(&self) -> Vec<VarId> {
        let mut vars = vec![self.subject];
        vars.extend(self.score_var);
        vars.extend(self.snippet_var);
        vars
    }

    pub fn wants_snippet(&self) -> bool {
        self.snippet_var.is_some()
    }
}

/// Parse and validate a search endpoint URL.
///
/// Accepts absolute `http`/`https` URLs with a host. Query strings and
/// fragments are rejected: endpoint-native parameters go in `fts:params`.
pub fn parse_endpoint_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{other}' (expected http or https)")),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    if url.port_or_known_default().is_none() {
        return Err("missing port".to_string());
    }
    if url.query().is_some() {
        return Err("query string not allowed; use fts:params".to_string());
    }
    if url.fragment().is_some() {
        return Err("fragment not allowed".to_string());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_vars_order() {
        let call = SearchCall::new(VarId(0), "blue")
            .with_snippet_var(VarId(2))
            .with_score_var(VarId(1));
        assert_eq!(call.output_vars(), vec![VarId(0), VarId(1), VarId(2)]);
        assert!(call.wants_snippet());

        let bare = SearchCall::new(VarId(5), "blue");
        assert_eq!(bare.output_vars(), vec![VarId(5)]);
        assert_eq!(bare.endpoint_kind, EndpointKind::Solr);
        assert_eq!(bare.target, TargetKind::Uri);
        assert_eq!(bare.timeout(), None);
    }

    #[test]
    fn test_parse_endpoint_url() {
        let url = parse_endpoint_url("http://h:8983/solr/core").unwrap();
        assert_eq!(url.port(), Some(8983));
        assert!(parse_endpoint_url("https://search.example.org/solr").is_ok());
        assert!(parse_endpoint_url("ftp://h/solr").is_err());
        assert!(parse_endpoint_url("not a url").is_err());
        assert!(parse_endpoint_url("http://h/solr?q=x").is_err());
        assert!(parse_endpoint_url("http://h/solr#frag").is_err());
        assert!(parse_endpoint_url("/relative/path").is_err());
    }
}
