//! Select response types and hit extraction.
//!
//! Solr writes a select response as:
//!
//! ```json
//! {
//!   "responseHeader": {"status": 0, "QTime": 3, "partialResults": false},
//!   "response": {"numFound": 2, "start": 0, "docs": [{"id": "...", "score": 0.9}]},
//!   "highlighting": {"<id>": {"<field>": ["...fragment..."]}}
//! }
//! ```
//!
//! Every field except `response.docs` is optional for decoding. The body is
//! read section by section through [`crate::DocScanner`]; this module holds
//! the section types and the document → hit mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{SearchHit, DEFAULT_ID_FIELD, DEFAULT_SCORE_FIELD, DEFAULT_SNIPPET_FIELD};

/// `responseHeader` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub status: i64,

    #[serde(rename = "QTime", default)]
    pub qtime: u64,

    /// Set by Solr when `timeAllowed` cut the search short.
    #[serde(rename = "partialResults", default)]
    pub partial_results: bool,
}

/// `highlighting` section: document id → field → fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Highlighting(pub HashMap<String, Map<String, JsonValue>>);

impl Highlighting {
    /// First fragment highlighted for a document.
    ///
    /// The preferred field is consulted first; otherwise fields are tried in
    /// name order so the choice is stable across responses.
    pub fn snippet_for(&self, id: &str, preferred_field: &str) -> Option<&str> {
        let fields = self.0.get(id)?;
        if let Some(s) = fields.get(preferred_field).and_then(first_text) {
            return Some(s);
        }
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        names
            .into_iter()
            .find_map(|name| fields.get(name).and_then(first_text))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct SolrErrorBody {
    pub error: SolrErrorDetail,
}

/// Error detail.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SolrErrorDetail {
    #[serde(default)]
    pub msg: Option<String>,

    #[serde(default)]
    pub code: Option<u16>,
}

impl SolrErrorDetail {
    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or("no message")
    }
}

/// Document fields consulted when building a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Key field carrying the hit identifier.
    pub id_field: String,
    /// Field carrying the relevance score.
    pub score_field: String,
    /// Inline snippet field, also the preferred highlighting field.
    pub snippet_field: String,
    /// Data fields whose values become hit identifiers. Empty means the
    /// identifier field alone.
    #[serde(default)]
    pub subject_fields: Vec<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            score_field: DEFAULT_SCORE_FIELD.to_string(),
            snippet_field: DEFAULT_SNIPPET_FIELD.to_string(),
            subject_fields: Vec::new(),
        }
    }
}

impl FieldMapping {
    /// Take hit identifiers from the data fields an `fl` parameter lists.
    ///
    /// The score field, globs (`*`, `attr_*`), functions and `[transformers]`
    /// are not data fields; `alias:field` contributes the alias. When `fl`
    /// lists no data field the identifier field is used.
    pub fn with_fl(mut self, fl: &str) -> Self {
        let mut names: Vec<String> = Vec::new();
        for entry in fl.split(|c: char| c == ',' || c.is_whitespace()) {
            let name = entry.split_once(':').map_or(entry, |(alias, _)| alias).trim();
            let is_data = !name.is_empty()
                && name != "score"
                && name != self.score_field
                && !name.contains(['*', '[', '(']);
            if is_data && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        self.subject_fields = names;
        self
    }
}

/// Key the `highlighting` section uses for a document: its identifier field.
pub fn doc_key(doc: &Map<String, JsonValue>, fields: &FieldMapping) -> Option<String> {
    doc.get(&fields.id_field).and_then(scalar_text)
}

/// Build the hits for one document, in field order.
///
/// With no subject fields, the identifier field yields one hit; it must be a
/// scalar or a single-element array (Solr returns multi-valued fields that
/// way), otherwise the document has no hit. With subject fields, every value
/// of every listed field yields a hit, multi-valued fields unwrapped.
///
/// All hits of a document share its score (missing → `0.0`) and inline
/// snippet (missing → empty).
pub fn hits_from_doc(doc: &Map<String, JsonValue>, fields: &FieldMapping) -> Vec<SearchHit> {
    let ids: Vec<String> = if fields.subject_fields.is_empty() {
        doc_key(doc, fields).into_iter().collect()
    } else {
        fields
            .subject_fields
            .iter()
            .filter_map(|name| doc.get(name))
            .flat_map(all_text)
            .collect()
    };
    if ids.is_empty() {
        return Vec::new();
    }

    let score = doc
        .get(&fields.score_field)
        .and_then(number_value)
        .unwrap_or(0.0);
    let snippet = doc
        .get(&fields.snippet_field)
        .and_then(first_text)
        .unwrap_or_default();
    ids.into_iter()
        .map(|id| SearchHit::new(id, score, snippet))
        .collect()
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Array(items) if items.len() == 1 => scalar_text(&items[0]),
        _ => None,
    }
}

fn all_text(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn number_value(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_text(value: &JsonValue) -> Option<&str> {
    match value {
        JsonValue::String(s) => Some(s.as_str()),
        JsonValue::Array(items) => items.iter().find_map(|v| v.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().unwrap().clone()
    }

    fn ids(hits: Vec<SearchHit>) -> Vec<String> {
        hits.into_iter().map(|h| h.id).collect()
    }

    #[test]
    fn test_hits_from_doc_full() {
        let fields = FieldMapping::default();
        let hits = hits_from_doc(
            &doc(json!({"id": "http://a", "score": 0.9, "snippet": ["first", "second"]})),
            &fields,
        );
        assert_eq!(hits, vec![SearchHit::new("http://a", 0.9, "first")]);
    }

    #[test]
    fn test_hits_from_doc_defaults() {
        let hits = hits_from_doc(&doc(json!({"id": "x"})), &FieldMapping::default());
        assert_eq!(hits[0].score, 0.0);
        assert_eq!(hits[0].snippet, "");
    }

    #[test]
    fn test_id_shapes() {
        let fields = FieldMapping::default();
        assert_eq!(ids(hits_from_doc(&doc(json!({"id": 42})), &fields)), vec!["42"]);
        assert_eq!(
            ids(hits_from_doc(&doc(json!({"id": ["http://a"]})), &fields)),
            vec!["http://a"]
        );
        assert!(hits_from_doc(&doc(json!({"id": ["a", "b"]})), &fields).is_empty());
        assert!(hits_from_doc(&doc(json!({"title": "no id"})), &fields).is_empty());
    }

    #[test]
    fn test_custom_fields() {
        let fields = FieldMapping {
            id_field: "uri".to_string(),
            score_field: "rank".to_string(),
            snippet_field: "summary".to_string(),
            ..Default::default()
        };
        let hits = hits_from_doc(
            &doc(json!({"uri": "http://a", "rank": "1.5", "summary": "text"})),
            &fields,
        );
        assert_eq!(hits, vec![SearchHit::new("http://a", 1.5, "text")]);
    }

    #[test]
    fn test_fl_data_fields() {
        let fields = FieldMapping::default().with_fl("a, b score,*,attr_*,[explain],c:d,a");
        assert_eq!(fields.subject_fields, vec!["a", "b", "c"]);

        let fields = FieldMapping::default().with_fl("*,score");
        assert!(fields.subject_fields.is_empty());
    }

    #[test]
    fn test_every_listed_field_value_is_a_hit() {
        let fields = FieldMapping::default().with_fl("a,b");
        let d = doc(json!({
            "id": "http://doc",
            "a": "http://x",
            "b": ["http://y", "plain"],
            "score": 2.0,
            "snippet": "s"
        }));
        let hits = hits_from_doc(&d, &fields);
        assert_eq!(ids(hits.clone()), vec!["http://x", "http://y", "plain"]);
        assert!(hits.iter().all(|h| h.score == 2.0 && h.snippet == "s"));
        assert_eq!(doc_key(&d, &fields).as_deref(), Some("http://doc"));

        assert!(hits_from_doc(&doc(json!({"id": "http://doc"})), &fields).is_empty());
    }

    #[test]
    fn test_snippet_prefers_configured_field() {
        let hl: Highlighting = serde_json::from_value(json!({
            "x": {"a_field": ["from a"], "snippet": ["preferred"]}
        }))
        .unwrap();
        assert_eq!(hl.snippet_for("x", "snippet"), Some("preferred"));
        assert_eq!(hl.snippet_for("x", "other"), Some("from a"));
        assert_eq!(hl.snippet_for("missing", "snippet"), None);
    }

    #[test]
    fn test_error_body() {
        let body: SolrErrorBody = serde_json::from_value(json!({
            "responseHeader": {"status": 400},
            "error": {"msg": "undefined field foo", "code": 400}
        }))
        .unwrap();
        assert_eq!(body.error.message(), "undefined field foo");
        assert_eq!(body.error.code, Some(400));
    }
}
