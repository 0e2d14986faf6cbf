//! Hit → solution row projection

use std::sync::Arc;

use fts_protocol::SearchHit;
use fts_vocab::TargetKind;
use reqwest::Url;

use crate::binding::{Binding, BindingRow};
use crate::call::SearchCall;
use crate::error::Result;
use crate::var_registry::VarId;

/// Builds one row per hit for a fixed call.
///
/// Rows bind the subject, and the score and snippet variables when the call
/// requested them; nothing else.
#[derive(Debug, Clone)]
pub struct Projector {
    schema: Arc<[VarId]>,
    target: TargetKind,
    has_score: bool,
    has_snippet: bool,
}

impl Projector {
    pub fn new(call: &SearchCall) -> Self {
        Self {
            schema: call.output_vars().into(),
            target: call.target,
            has_score: call.score_var.is_some(),
            has_snippet: call.snippet_var.is_some(),
        }
    }

    pub fn schema(&self) -> &[VarId] {
        &self.schema
    }

    /// Project a hit; `None` when the identifier cannot be a subject of the
    /// call's target type.
    pub fn project(&self, hit: &SearchHit) -> Result<Option<BindingRow>> {
        let subject = match self.target {
            TargetKind::Uri => match parse_iri(&hit.id) {
                Some(iri) => Binding::Iri(iri),
                None => return Ok(None),
            },
            TargetKind::Literal => Binding::plain(hit.id.as_str()),
        };

        let mut values = Vec::with_capacity(self.schema.len());
        values.push(subject);
        if self.has_score {
            values.push(Binding::Double(hit.score));
        }
        if self.has_snippet {
            values.push(Binding::plain(hit.snippet.as_str()));
        }
        BindingRow::new(self.schema.clone(), values).map(Some)
    }
}

/// Accept an identifier as an absolute IRI, keeping its exact spelling.
///
/// Characters RFC 3987 excludes from IRIs are rejected outright; the rest
/// must parse as an absolute URL (scheme required).
fn parse_iri(id: &str) -> Option<Arc<str>> {
    let excluded = |c: char| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`')
    };
    if id.is_empty() || id.chars().any(excluded) {
        return None;
    }
    Url::parse(id).ok().map(|_| Arc::from(id))
}
