//! Solr-compatible `select` adapter.
//!
//! Sends `GET {endpoint}/select?q=...` with the caller's params and the
//! adapter defaults, then decodes the JSON body incrementally: each
//! document becomes a hit as soon as its closing brace arrives.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use fts_protocol::{
    doc_key, hits_from_doc, select_url, DocScanner, FieldMapping, Highlighting, ScanEvent,
    SearchHit, SelectRequest, SolrErrorBody, SolrParams, TIME_ALLOWED_PARAM,
};
use fts_vocab::EndpointKind;
use reqwest::{Client, Response, Url};
use tracing::debug;

use super::{BoxedHitStream, DispatchRequest, EndpointAdapter, HitStream};
use crate::error::{FtsError, Result};

/// Longest error body quoted in an `EndpointRejected` message
const MAX_ERROR_BODY: usize = 512;

/// Adapter for Solr-compatible endpoints.
pub struct SolrAdapter {
    client: Client,
    fields: FieldMapping,
}

impl SolrAdapter {
    pub fn new(client: Client, fields: FieldMapping) -> Self {
        Self { client, fields }
    }

    pub fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    /// Field mapping for one call: an `fl` in the caller's params names the
    /// fields hit identifiers are read from.
    pub fn fields_for(&self, params: Option<&SolrParams>) -> FieldMapping {
        match params.and_then(|p| p.get("fl")) {
            Some(fl) => self.fields.clone().with_fl(fl),
            None => self.fields.clone(),
        }
    }

    fn caller_params(request: &DispatchRequest<'_>) -> Result<Option<SolrParams>> {
        match &request.call.params {
            Some(raw) => Ok(Some(SolrParams::parse(raw)?)),
            None => Ok(None),
        }
    }

    /// Full request URL for a dispatch.
    ///
    /// Caller params override the adapter defaults `fl=*,score`,
    /// `hl=true` (snippet requested) and `timeAllowed` (bounded deadline).
    pub fn request_url(&self, request: &DispatchRequest<'_>) -> Result<Url> {
        let call = request.call;
        let mut select = SelectRequest::new(call.query.as_str());
        if let Some(params) = Self::caller_params(request)? {
            select = select.with_params(params);
        }
        select = select.with_default("fl", "*,score");
        if call.wants_snippet() {
            select = select.with_default("hl", "true");
        }
        if let Some(timeout) = request.timeout {
            select = select.with_default(TIME_ALLOWED_PARAM, timeout.as_millis().to_string());
        }

        let base = select_url(request.endpoint.as_str());
        let mut url = Url::parse(&base).map_err(|e| FtsError::BadEndpoint {
            endpoint: base.clone(),
            reason: e.to_string(),
        })?;
        url.set_query(Some(&select.query_string()));
        Ok(url)
    }
}

impl fmt::Debug for SolrAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolrAdapter")
            .field("fields", &self.fields)
            .finish()
    }
}

#[async_trait]
impl EndpointAdapter for SolrAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Solr
    }

    async fn dispatch(&self, request: DispatchRequest<'_>) -> Result<BoxedHitStream> {
        let url = self.request_url(&request)?;
        let fields = self.fields_for(Self::caller_params(&request)?.as_ref());
        debug!(url = %url, subject_fields = ?fields.subject_fields, "dispatching Solr select");

        let mut http_request = self.client.get(url);
        if let Some(timeout) = request.timeout {
            http_request = http_request.timeout(timeout);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| map_transport_error(&e, request.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(status.as_u16(), &body));
        }

        Ok(Box::new(SolrHitStream::new(
            response,
            fields,
            request.call.wants_snippet(),
            request.timeout,
        )))
    }
}

/// Hits decoded from a streamed select response.
///
/// When snippets are requested, hits are held until the `highlighting`
/// section has been read (Solr writes it after the documents) or the body
/// ends, then released in document order. Hits still held when the deadline
/// expires are released by [`HitStream::take_buffered`] with their inline
/// snippets.
pub struct SolrHitStream {
    response: Option<Response>,
    scanner: DocScanner,
    fields: FieldMapping,
    hold_for_highlighting: bool,
    /// Decoded hits with the highlighting key of their document
    ready: VecDeque<(String, SearchHit)>,
    highlighting: Option<Highlighting>,
    body_done: bool,
    endpoint_partial: bool,
    timeout: Option<Duration>,
}

impl SolrHitStream {
    fn new(
        response: Response,
        fields: FieldMapping,
        hold_for_highlighting: bool,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            response: Some(response),
            scanner: DocScanner::new(),
            fields,
            hold_for_highlighting,
            ready: VecDeque::new(),
            highlighting: None,
            body_done: false,
            endpoint_partial: false,
            timeout,
        }
    }

    fn can_release(&self) -> bool {
        !self.hold_for_highlighting || self.body_done || self.highlighting.is_some()
    }

    fn attach_snippet(&self, key: &str, hit: SearchHit) -> SearchHit {
        let highlighted = self
            .highlighting
            .as_ref()
            .and_then(|hl| hl.snippet_for(key, &self.fields.snippet_field));
        match highlighted {
            Some(s) => hit.with_snippet(s),
            None => hit,
        }
    }

    fn on_event(&mut self, event: ScanEvent) -> Result<()> {
        match event {
            ScanEvent::Doc(doc) => {
                let hits = hits_from_doc(&doc, &self.fields);
                if hits.is_empty() {
                    debug!(
                        id_field = %self.fields.id_field,
                        subject_fields = ?self.fields.subject_fields,
                        "skipping document without a usable identifier"
                    );
                }
                let key = doc_key(&doc, &self.fields);
                for hit in hits {
                    let key = key.clone().unwrap_or_else(|| hit.id.clone());
                    self.ready.push_back((key, hit));
                }
            }
            ScanEvent::Header(header) => {
                if header.partial_results {
                    debug!("endpoint reported partial results");
                    self.endpoint_partial = true;
                }
            }
            ScanEvent::Highlighting(hl) => self.highlighting = Some(hl),
            ScanEvent::Error(detail) => {
                return Err(FtsError::EndpointRejected {
                    status: detail.code.unwrap_or(200),
                    message: detail.message().to_string(),
                })
            }
        }
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<()> {
        let Some(response) = self.response.as_mut() else {
            self.body_done = true;
            return Ok(());
        };
        match response.chunk().await {
            Ok(Some(bytes)) => self.scanner.push(&bytes),
            Ok(None) => {
                self.response = None;
                self.scanner.finish()?;
                self.body_done = true;
            }
            Err(e) => {
                self.response = None;
                return Err(map_transport_error(&e, self.timeout));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl HitStream for SolrHitStream {
    async fn next_hit(&mut self) -> Result<Option<SearchHit>> {
        loop {
            if self.can_release() {
                if let Some((key, hit)) = self.ready.pop_front() {
                    return Ok(Some(self.attach_snippet(&key, hit)));
                }
            }
            if self.body_done {
                return Ok(None);
            }
            match self.scanner.next_event()? {
                Some(event) => self.on_event(event)?,
                None => self.read_chunk().await?,
            }
        }
    }

    fn endpoint_partial(&self) -> bool {
        self.endpoint_partial
    }

    fn take_buffered(&mut self) -> Vec<SearchHit> {
        self.response = None;
        let ready = std::mem::take(&mut self.ready);
        ready
            .into_iter()
            .map(|(key, hit)| self.attach_snippet(&key, hit))
            .collect()
    }
}

fn map_transport_error(e: &reqwest::Error, timeout: Option<Duration>) -> FtsError {
    if e.is_timeout() {
        FtsError::Timeout {
            elapsed: timeout.unwrap_or_default(),
        }
    } else {
        FtsError::EndpointUnreachable(error_chain(e))
    }
}

/// `e: cause: cause`, since reqwest's Display omits the source chain
fn error_chain(e: &reqwest::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn rejected(status: u16, body: &str) -> FtsError {
    let message = match serde_json::from_str::<SolrErrorBody>(body) {
        Ok(envelope) => envelope.error.message().to_string(),
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(MAX_ERROR_BODY).collect()
            }
        }
    };
    FtsError::EndpointRejected { status, message }
}
