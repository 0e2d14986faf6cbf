//! Process-wide search configuration.
//!
//! Defaults applied when a call omits `fts:endpoint`, `fts:endpointType` or
//! `fts:timeout`, plus HTTP client and Solr field settings. Read from the
//! environment once and read-only afterwards.

use std::time::Duration;

use fts_protocol::FieldMapping;
use fts_vocab::EndpointKind;
use once_cell::sync::OnceCell;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::call::parse_endpoint_url;
use crate::error::{FtsError, Result};

pub const ENV_DEFAULT_ENDPOINT: &str = "FTS_DEFAULT_ENDPOINT";
pub const ENV_DEFAULT_ENDPOINT_TYPE: &str = "FTS_DEFAULT_ENDPOINT_TYPE";
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "FTS_DEFAULT_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "FTS_CONNECT_TIMEOUT_MS";
pub const ENV_SOLR_ID_FIELD: &str = "FTS_SOLR_ID_FIELD";
pub const ENV_SOLR_SCORE_FIELD: &str = "FTS_SOLR_SCORE_FIELD";
pub const ENV_SOLR_SNIPPET_FIELD: &str = "FTS_SOLR_SNIPPET_FIELD";

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

static GLOBAL: OnceCell<FtsConfig> = OnceCell::new();

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtsConfig {
    /// Endpoint used when a call has no `fts:endpoint`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_endpoint: Option<String>,

    #[serde(default)]
    pub default_endpoint_kind: EndpointKind,

    /// Timeout used when a call has no usable `fts:timeout`; `None` is
    /// unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_ms: Option<u64>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Solr document fields.
    #[serde(default)]
    pub solr: FieldMapping,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self {
            default_endpoint: None,
            default_endpoint_kind: EndpointKind::default(),
            default_timeout_ms: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            solr: FieldMapping::default(),
        }
    }
}

impl FtsConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a variable lookup. Unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(raw) = get(ENV_DEFAULT_ENDPOINT) {
            parse_endpoint_url(&raw).map_err(|reason| FtsError::BadConfig {
                key: ENV_DEFAULT_ENDPOINT,
                reason,
            })?;
            config.default_endpoint = Some(raw);
        }
        if let Some(raw) = get(ENV_DEFAULT_ENDPOINT_TYPE) {
            config.default_endpoint_kind =
                raw.parse().map_err(|e: fts_vocab::VocabError| FtsError::BadConfig {
                    key: ENV_DEFAULT_ENDPOINT_TYPE,
                    reason: e.to_string(),
                })?;
        }
        if let Some(raw) = get(ENV_DEFAULT_TIMEOUT_MS) {
            config.default_timeout_ms = Some(parse_ms(ENV_DEFAULT_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = get(ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout_ms = parse_ms(ENV_CONNECT_TIMEOUT_MS, &raw)?;
        }
        if let Some(field) = get(ENV_SOLR_ID_FIELD) {
            config.solr.id_field = field;
        }
        if let Some(field) = get(ENV_SOLR_SCORE_FIELD) {
            config.solr.score_field = field;
        }
        if let Some(field) = get(ENV_SOLR_SNIPPET_FIELD) {
            config.solr.snippet_field = field;
        }

        Ok(config)
    }

    /// Process-wide configuration, read from the environment on first use.
    pub fn global() -> Result<&'static FtsConfig> {
        GLOBAL.get_or_try_init(Self::from_env)
    }

    /// Install the process-wide configuration before first use.
    ///
    /// Returns the rejected config if one is already installed.
    pub fn install_global(config: FtsConfig) -> std::result::Result<(), FtsConfig> {
        GLOBAL.set(config)
    }

    pub fn with_default_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.default_endpoint = Some(endpoint.into());
        self
    }

    /// The default endpoint as a validated URL.
    pub fn default_endpoint_url(&self) -> Result<Option<Url>> {
        self.default_endpoint
            .as_deref()
            .map(|raw| {
                parse_endpoint_url(raw).map_err(|reason| FtsError::BadConfig {
                    key: ENV_DEFAULT_ENDPOINT,
                    reason,
                })
            })
            .transpose()
    }

    pub fn with_default_endpoint_kind(mut self, kind: EndpointKind) -> Self {
        self.default_endpoint_kind = kind;
        self
    }

    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    pub fn with_solr_fields(mut self, fields: FieldMapping) -> Self {
        self.solr = fields;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn parse_ms(key: &'static str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|e| FtsError::BadConfig {
        key,
        reason: format!("'{raw}' is not a non-negative integer ({e})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FtsConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FtsConfig::default());
        assert_eq!(config.default_endpoint_kind, EndpointKind::Solr);
        assert_eq!(config.default_timeout_ms, None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.solr.id_field, "id");
    }

    #[test]
    fn test_from_lookup() {
        let config = FtsConfig::from_lookup(lookup(&[
            (ENV_DEFAULT_ENDPOINT, "http://solr:8983/solr/core"),
            (ENV_DEFAULT_ENDPOINT_TYPE, "solr"),
            (ENV_DEFAULT_TIMEOUT_MS, "2500"),
            (ENV_CONNECT_TIMEOUT_MS, " 100 "),
            (ENV_SOLR_ID_FIELD, "uri"),
            (ENV_SOLR_SNIPPET_FIELD, ""),
        ]))
        .unwrap();
        assert_eq!(
            config.default_endpoint.as_deref(),
            Some("http://solr:8983/solr/core")
        );
        assert!(config.default_endpoint_url().unwrap().is_some());
        assert_eq!(config.default_timeout_ms, Some(2500));
        assert_eq!(config.connect_timeout_ms, 100);
        assert_eq!(config.solr.id_field, "uri");
        assert_eq!(config.solr.snippet_field, "snippet");
    }

    #[test]
    fn test_invalid_values() {
        let err = FtsConfig::from_lookup(lookup(&[(ENV_DEFAULT_TIMEOUT_MS, "-1")])).unwrap_err();
        assert!(matches!(
            err,
            FtsError::BadConfig {
                key: ENV_DEFAULT_TIMEOUT_MS,
                ..
            }
        ));

        let err =
            FtsConfig::from_lookup(lookup(&[(ENV_DEFAULT_ENDPOINT_TYPE, "elastic")])).unwrap_err();
        assert!(matches!(err, FtsError::BadConfig { .. }));

        let err =
            FtsConfig::from_lookup(lookup(&[(ENV_DEFAULT_ENDPOINT, "solr:8983")])).unwrap_err();
        assert!(matches!(err, FtsError::BadConfig { .. }));
    }

    #[test]
    fn test_serde() {
        let config = FtsConfig::default().with_default_timeout_ms(1000);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"default_timeout_ms\":1000"));
        assert!(!json.contains("default_endpoint\""));

        let parsed: FtsConfig =
            serde_json::from_str(r#"{"default_endpoint":"http://h:1/solr"}"#).unwrap();
        assert_eq!(parsed.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
        assert!(parsed.default_endpoint_url().unwrap().is_some());

        let bad = FtsConfig::default().with_default_endpoint("nope");
        assert!(bad.default_endpoint_url().is_err());
    }
}
