//! Select request construction.
//!
//! A request is the search string as `q`, followed by the caller's
//! endpoint-native parameters in their given order, followed by adapter
//! defaults that the caller did not set, with `wt=json` always last.

use crate::error::{ProtocolError, Result};
use crate::{SELECT_HANDLER, WT_JSON, WT_PARAM};

/// Endpoint-native query parameters from `fts:params`.
///
/// The raw string is an `application/x-www-form-urlencoded` query string
/// (`defType=dismax&bf=uses%5E50`), encoded by the caller. Parsing decodes
/// each key and value; [`SelectRequest::query_string`] re-encodes them, so a
/// value round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolrParams {
    pairs: Vec<(String, String)>,
}

impl SolrParams {
    /// Parse an urlencoded query string.
    ///
    /// Empty segments (`a=1&&b=2`) are skipped. A segment without `=` is a
    /// key with an empty value. A leading `?` is tolerated.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut pairs = Vec::new();

        for segment in raw.split('&') {
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = decode_component(segment, key)?;
            if key.is_empty() {
                return Err(ProtocolError::InvalidParams {
                    segment: segment.to_string(),
                    reason: "empty parameter name".to_string(),
                });
            }
            let value = decode_component(segment, value)?;
            pairs.push((key, value));
        }

        Ok(Self { pairs })
    }

    /// Build from already-decoded pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn decode_component(segment: &str, component: &str) -> Result<String> {
    let plus_as_space = component.replace('+', " ");
    urlencoding::decode(&plus_as_space)
        .map(|cow| cow.into_owned())
        .map_err(|e| ProtocolError::InvalidParams {
            segment: segment.to_string(),
            reason: e.to_string(),
        })
}

/// A `select` request against a Solr-compatible endpoint.
#[derive(Debug, Clone)]
pub struct SelectRequest {
    query: String,
    params: SolrParams,
    defaults: Vec<(String, String)>,
}

impl SelectRequest {
    /// Create a request for a search string; it is sent verbatim as `q`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: SolrParams::default(),
            defaults: Vec::new(),
        }
    }

    /// Set the caller's endpoint-native parameters.
    pub fn with_params(mut self, params: SolrParams) -> Self {
        self.params = params;
        self
    }

    /// Add an adapter default. It is only sent when the caller's params do
    /// not set the same key; the first default registered for a key wins.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !self.defaults.iter().any(|(k, _)| *k == key) {
            self.defaults.push((key, value.into()));
        }
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn params(&self) -> &SolrParams {
        &self.params
    }

    /// Decoded parameter pairs in wire order.
    ///
    /// A `q` key in the caller's params is never sent: the search string
    /// owns `q`.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let capacity = 2 + self.params.len() + self.defaults.len();
        let mut out: Vec<(&str, &str)> = Vec::with_capacity(capacity);
        out.push(("q", self.query.as_str()));
        out.extend(self.params.iter().filter(|(k, _)| *k != "q"));
        for (k, v) in &self.defaults {
            if k != WT_PARAM && !self.params.contains_key(k) {
                out.push((k.as_str(), v.as_str()));
            }
        }
        if !self.params.contains_key(WT_PARAM) {
            out.push((WT_PARAM, WT_JSON));
        }
        out
    }

    /// Urlencoded query string in wire order.
    pub fn query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Append the select handler to an endpoint base URL.
///
/// `http://h:1/solr/core`, `http://h:1/solr/core/` and
/// `http://h:1/solr/core/select` all yield `http://h:1/solr/core/select`.
pub fn select_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    let suffix = format!("/{SELECT_HANDLER}");
    if trimmed.ends_with(&suffix) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_decodes() {
        let params = SolrParams::parse("defType=dismax&bf=uses%5E50&fq=a+b").unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("defType"), Some("dismax"));
        assert_eq!(params.get("bf"), Some("uses^50"));
        assert_eq!(params.get("fq"), Some("a b"));
    }

    #[test]
    fn test_parse_params_tolerates_empty_segments() {
        let params = SolrParams::parse("?a=1&&debug&").unwrap();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("debug"), Some(""));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_parse_params_rejects_empty_key() {
        let err = SolrParams::parse("=x").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParams { .. }));
    }

    #[test]
    fn test_parse_params_rejects_bad_utf8() {
        assert!(SolrParams::parse("a=%FF%FE").is_err());
    }

    #[test]
    fn test_query_string_order() {
        let request = SelectRequest::new("blue !red")
            .with_params(SolrParams::parse("defType=dismax").unwrap())
            .with_default("fl", "*,score");
        assert_eq!(
            request.query_string(),
            "q=blue%20%21red&defType=dismax&fl=%2A%2Cscore&wt=json"
        );
    }

    #[test]
    fn test_params_override_defaults() {
        let request = SelectRequest::new("x")
            .with_params(SolrParams::parse("fl=id&wt=json").unwrap())
            .with_default("fl", "*,score")
            .with_default("hl", "true");
        let pairs = request.pairs();
        assert_eq!(
            pairs,
            vec![("q", "x"), ("fl", "id"), ("wt", "json"), ("hl", "true")]
        );
    }

    #[test]
    fn test_caller_q_is_not_sent() {
        let request =
            SelectRequest::new("real").with_params(SolrParams::from_pairs([("q", "other")]));
        let pairs = request.pairs();
        assert_eq!(pairs.iter().filter(|(k, _)| *k == "q").count(), 1);
        assert_eq!(pairs[0], ("q", "real"));
    }

    #[test]
    fn test_select_url() {
        assert_eq!(select_url("http://h:1/solr"), "http://h:1/solr/select");
        assert_eq!(select_url("http://h:1/solr/"), "http://h:1/solr/select");
        assert_eq!(select_url("http://h:1/solr/select"), "http://h:1/solr/select");
    }
}
