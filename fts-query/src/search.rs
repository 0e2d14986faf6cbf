//! External search operator (`Pattern::Search`)
//!
//! Executes one [`SearchCall`] against its endpoint and emits a row per hit:
//! - subject        -> `Binding::Iri` (targetType URI) or `Binding::Plain`
//! - fts:score      -> `Binding::Double`
//! - fts:snippet    -> `Binding::Plain`
//!
//! # Deadlines
//!
//! The deadline starts in `open()`. If it expires before the first hit
//! arrives the operator fails with `Timeout`. If it expires later, the
//! stream ends cleanly, `is_partial()` becomes true, and a
//! `QueryWarning::PartialResults` is recorded in the context metadata.
//! Hits the adapter had decoded but was still holding (e.g. waiting for
//! highlighting) count as arrived; they are emitted before the stream ends.
//!
//! # Cancellation
//!
//! Dispatch and every hit are raced against the context's cancel token; a
//! cancelled operator drops its response and fails with `Cancelled`.

use std::collections::VecDeque;

use async_trait::async_trait;
use fts_protocol::SearchHit;
use tracing::{debug, warn, Instrument, Span};

use crate::adapter::{BoxedHitStream, DispatchRequest};
use crate::binding::BindingRow;
use crate::call::SearchCall;
use crate::context::{ExecutionContext, QueryWarning};
use crate::deadline::{race, CancelToken, Deadline, Outcome};
use crate::error::{FtsError, Result};
use crate::operator::{Operator, OperatorState};
use crate::projector::Projector;
use crate::var_registry::VarId;

/// Operator for one external search call
pub struct SearchOperator {
    call: SearchCall,
    projector: Projector,
    state: OperatorState,
    stream: Option<BoxedHitStream>,
    /// Hits handed over by the stream when the deadline expired
    pending: VecDeque<SearchHit>,
    expired: bool,
    deadline: Deadline,
    cancel: CancelToken,
    hits_received: usize,
    rows_emitted: usize,
    partial: bool,
    /// Subject variable name used in warnings
    label: String,
    span: Span,
}

impl SearchOperator {
    pub fn new(call: SearchCall) -> Self {
        let projector = Projector::new(&call);
        Self {
            projector,
            state: OperatorState::Created,
            stream: None,
            pending: VecDeque::new(),
            expired: false,
            deadline: Deadline::unbounded(),
            cancel: CancelToken::never(),
            hits_received: 0,
            rows_emitted: 0,
            partial: false,
            label: format!("?_{}", call.subject.0),
            span: Span::none(),
            call,
        }
    }

    /// Name the subject variable in warnings (e.g. `?r`)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn call(&self) -> &SearchCall {
        &self.call
    }

    pub fn state(&self) -> OperatorState {
        self.state
    }

    /// True once the deadline truncated a stream that had produced hits, or
    /// the endpoint reported partial results
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn hits_received(&self) -> usize {
        self.hits_received
    }

    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    fn fail(&mut self, err: FtsError) -> FtsError {
        self.stream = None;
        self.state = OperatorState::Failed;
        err
    }

    /// End the stream; the response body is dropped with it
    fn finish(&mut self) {
        self.stream = None;
        self.state = OperatorState::Closed;
    }

    /// Deadline reached: take over the stream's held hits and drop it.
    fn expire(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            self.pending.extend(stream.take_buffered());
        }
        self.expired = true;
        if self.hits_received == 0 && self.pending.is_empty() {
            let elapsed = self.deadline.elapsed();
            return Err(self.fail(FtsError::Timeout { elapsed }));
        }
        Ok(())
    }

    /// End a stream the deadline cut short.
    fn truncate(&mut self, ctx: &ExecutionContext) {
        let elapsed = self.deadline.elapsed();
        warn!(
            hits = self.hits_received,
            rows = self.rows_emitted,
            elapsed_ms = elapsed.as_millis() as u64,
            "fts search deadline expired; returning partial results"
        );
        self.partial = true;
        ctx.metadata.push_warning(QueryWarning::PartialResults {
            subject: self.label.clone(),
            rows: self.rows_emitted,
            elapsed,
        });
        self.finish();
    }

    fn accept(&mut self, hit: SearchHit) -> Result<Option<BindingRow>> {
        self.hits_received += 1;
        match self.projector.project(&hit) {
            Ok(Some(row)) => {
                self.rows_emitted += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                debug!(id = %hit.id, "dropping hit: identifier is not an IRI");
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn open_inner(&mut self, ctx: &ExecutionContext) -> Result<()> {
        let adapter = ctx.adapters.get(self.call.endpoint_kind)?;
        let endpoint = match &self.call.endpoint {
            Some(url) => url.clone(),
            None => ctx
                .config
                .default_endpoint_url()?
                .ok_or_else(|| FtsError::BadEndpoint {
                    endpoint: String::new(),
                    reason: "no fts:endpoint given and no default endpoint configured"
                        .to_string(),
                })?,
        };
        let timeout = self
            .call
            .timeout()
            .or_else(|| ctx.config.default_timeout_ms.map(std::time::Duration::from_millis));

        self.cancel = ctx.cancel.clone();
        if self.cancel.is_cancelled() {
            return Err(FtsError::Cancelled);
        }

        self.deadline = Deadline::start(timeout);
        let request = DispatchRequest {
            call: &self.call,
            endpoint: &endpoint,
            timeout,
        };
        let dispatch = adapter
            .dispatch(request)
            .instrument(tracing::debug_span!("fts_dispatch", url = %endpoint));

        match race(&self.deadline, &mut self.cancel, dispatch).await {
            Outcome::Ready(Ok(stream)) => {
                self.stream = Some(stream);
                Ok(())
            }
            Outcome::Ready(Err(FtsError::Timeout { .. })) | Outcome::Expired => {
                Err(FtsError::Timeout {
                    elapsed: self.deadline.elapsed(),
                })
            }
            Outcome::Ready(Err(e)) => Err(e),
            Outcome::Cancelled => Err(FtsError::Cancelled),
        }
    }

    async fn next_inner(&mut self, ctx: &ExecutionContext) -> Result<Option<BindingRow>> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                match self.accept(hit)? {
                    Some(row) => return Ok(Some(row)),
                    None => continue,
                }
            }
            if self.expired {
                self.truncate(ctx);
                return Ok(None);
            }
            if self.deadline.is_expired() {
                self.expire()?;
                continue;
            }
            let outcome = match self.stream.as_mut() {
                Some(stream) => race(&self.deadline, &mut self.cancel, stream.next_hit()).await,
                None => {
                    return Err(self.fail(FtsError::Internal(
                        "search operator has no open stream".to_string(),
                    )))
                }
            };

            match outcome {
                Outcome::Ready(Ok(Some(hit))) => {
                    if let Some(row) = self.accept(hit)? {
                        return Ok(Some(row));
                    }
                }
                Outcome::Ready(Ok(None)) => {
                    let endpoint_partial = self
                        .stream
                        .as_ref()
                        .is_some_and(|s| s.endpoint_partial());
                    if endpoint_partial {
                        self.partial = true;
                        ctx.metadata.push_warning(QueryWarning::EndpointPartial {
                            subject: self.label.clone(),
                        });
                    }
                    debug!(
                        hits = self.hits_received,
                        rows = self.rows_emitted,
                        "fts search exhausted"
                    );
                    self.finish();
                    return Ok(None);
                }
                Outcome::Ready(Err(FtsError::Timeout { .. })) | Outcome::Expired => {
                    self.expire()?;
                }
                Outcome::Ready(Err(e)) => return Err(self.fail(e)),
                Outcome::Cancelled => {
                    debug!("fts search cancelled");
                    return Err(self.fail(FtsError::Cancelled));
                }
            }
        }
    }
}

#[async_trait]
impl Operator for SearchOperator {
    fn schema(&self) -> &[VarId] {
        self.projector.schema()
    }

    async fn open(&mut self, ctx: &ExecutionContext) -> Result<()> {
        if !self.state.can_open() {
            return Err(FtsError::OperatorAlreadyOpened);
        }

        self.span = tracing::debug_span!(
            "fts_search",
            endpoint = self
                .call
                .endpoint
                .as_ref()
                .map(|u| u.as_str())
                .or(ctx.config.default_endpoint.as_deref())
                .unwrap_or(""),
            endpoint_type = %self.call.endpoint_kind,
            target_type = %self.call.target,
            timeout_ms = self.call.timeout_ms.or(ctx.config.default_timeout_ms),
        );

        let span = self.span.clone();
        match self.open_inner(ctx).instrument(span).await {
            Ok(()) => {
                self.state = OperatorState::Open;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<BindingRow>> {
        match self.state {
            OperatorState::Created => return Err(FtsError::OperatorNotOpened),
            OperatorState::Closed | OperatorState::Failed => return Ok(None),
            OperatorState::Open | OperatorState::Streaming => {}
        }
        self.state = OperatorState::Streaming;

        let span = self.span.clone();
        self.next_inner(ctx).instrument(span).await
    }

    fn close(&mut self) {
        self.stream = None;
        self.pending.clear();
        if self.state != OperatorState::Failed {
            self.state = OperatorState::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterRegistry, EndpointAdapter, HitStream};
    use crate::binding::Binding;
    use crate::config::FtsConfig;
    use crate::deadline::cancel_pair;
    use fts_vocab::{EndpointKind, TargetKind};
    use reqwest::Url;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// In-memory adapter: hits separated by a fixed delay
    #[derive(Debug)]
    struct ScriptedAdapter {
        hits: Vec<SearchHit>,
        dispatch_delay: Duration,
        hit_delay: Duration,
        fail_with: Option<fn() -> FtsError>,
        /// Decode every hit but never yield one, like a stream waiting for
        /// a trailing section
        hold: bool,
        dispatches: Arc<AtomicUsize>,
    }

    impl ScriptedAdapter {
        fn new(ids: &[&str]) -> Self {
            Self {
                hits: ids
                    .iter()
                    .enumerate()
                    .map(|(i, id)| SearchHit::new(*id, 1.0 / (i as f64 + 1.0), format!("snip {i}")))
                    .collect(),
                dispatch_delay: Duration::ZERO,
                hit_delay: Duration::ZERO,
                fail_with: None,
                hold: false,
                dispatches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct ScriptedStream {
        hits: VecDeque<SearchHit>,
        delay: Duration,
        hold: bool,
    }

    #[async_trait]
    impl HitStream for ScriptedStream {
        async fn next_hit(&mut self) -> Result<Option<SearchHit>> {
            if self.hold {
                std::future::pending::<()>().await;
            }
            if self.hits.is_empty() {
                return Ok(None);
            }
            tokio::time::sleep(self.delay).await;
            Ok(self.hits.pop_front())
        }

        fn take_buffered(&mut self) -> Vec<SearchHit> {
            if self.hold {
                self.hits.drain(..).collect()
            } else {
                Vec::new()
            }
        }
    }

    #[async_trait]
    impl EndpointAdapter for ScriptedAdapter {
        fn kind(&self) -> EndpointKind {
            EndpointKind::Solr
        }

        async fn dispatch(&self, _request: DispatchRequest<'_>) -> Result<BoxedHitStream> {
            self.dispatches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.dispatch_delay).await;
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            Ok(Box::new(ScriptedStream {
                hits: self.hits.iter().cloned().collect(),
                delay: self.hit_delay,
                hold: self.hold,
            }))
        }
    }

    fn ctx(adapter: ScriptedAdapter) -> ExecutionContext {
        ExecutionContext::with_adapters(
            FtsConfig::default(),
            AdapterRegistry::new().with(adapter),
        )
    }

    fn call() -> SearchCall {
        SearchCall::new(VarId(0), "blue")
            .with_endpoint(Url::parse("http://h:1/solr").unwrap())
            .with_score_var(VarId(1))
    }

    async fn drain(op: &mut SearchOperator, ctx: &ExecutionContext) -> Result<Vec<BindingRow>> {
        let mut rows = Vec::new();
        while let Some(row) = op.next(ctx).await? {
            rows.push(row);
        }
        Ok(rows)
    }

    #[tokio::test]
    async fn test_rows_in_hit_order() {
        let ctx = ctx(ScriptedAdapter::new(&["http://a", "http://b"]));
        let mut op = SearchOperator::new(call());
        assert_eq!(op.schema(), &[VarId(0), VarId(1)]);
        op.open(&ctx).await.unwrap();
        assert_eq!(op.state(), OperatorState::Open);

        let rows = drain(&mut op, &ctx).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(VarId(0)), Some(&Binding::iri("http://a")));
        assert_eq!(rows[0].get(VarId(1)), Some(&Binding::Double(1.0)));
        assert_eq!(rows[1].get(VarId(0)), Some(&Binding::iri("http://b")));
        assert_eq!(op.state(), OperatorState::Closed);
        assert!(!op.is_partial());
        assert!(op.next(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_iri_hits_dropped() {
        let ctx = ctx(ScriptedAdapter::new(&["not a uri", "http://a"]));
        let mut op = SearchOperator::new(call());
        op.open(&ctx).await.unwrap();
        let rows = drain(&mut op, &ctx).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(op.hits_received(), 2);
        assert_eq!(op.rows_emitted(), 1);
    }

    #[tokio::test]
    async fn test_literal_target_keeps_all_hits() {
        let ctx = ctx(ScriptedAdapter::new(&["not a uri"]));
        let mut op = SearchOperator::new(call().with_target(TargetKind::Literal));
        op.open(&ctx).await.unwrap();
        let rows = drain(&mut op, &ctx).await.unwrap();
        assert_eq!(rows[0].get(VarId(0)), Some(&Binding::plain("not a uri")));
    }

    #[tokio::test]
    async fn test_lifecycle_misuse() {
        let ctx = ctx(ScriptedAdapter::new(&[]));
        let mut op = SearchOperator::new(call());
        assert!(matches!(
            op.next(&ctx).await.unwrap_err(),
            FtsError::OperatorNotOpened
        ));
        op.open(&ctx).await.unwrap();
        assert!(matches!(
            op.open(&ctx).await.unwrap_err(),
            FtsError::OperatorAlreadyOpened
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let ctx = ctx(ScriptedAdapter::new(&["http://a", "http://b"]));
        let mut op = SearchOperator::new(call());
        op.open(&ctx).await.unwrap();
        assert!(op.next(&ctx).await.unwrap().is_some());
        op.close();
        op.close();
        assert_eq!(op.state(), OperatorState::Closed);
        assert!(op.next(&ctx).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_before_first_hit() {
        let mut adapter = ScriptedAdapter::new(&["http://a"]);
        adapter.dispatch_delay = Duration::from_secs(5);
        let ctx = ctx(adapter);
        let mut op = SearchOperator::new(call().with_timeout_ms(0));
        let err = op.open(&ctx).await.unwrap_err();
        assert!(matches!(err, FtsError::Timeout { .. }));
        assert_eq!(op.state(), OperatorState::Failed);
        assert!(op.next(&ctx).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_waiting_for_first_hit() {
        let mut adapter = ScriptedAdapter::new(&["http://a"]);
        adapter.hit_delay = Duration::from_secs(5);
        let ctx = ctx(adapter);
        let mut op = SearchOperator::new(call().with_timeout_ms(100));
        op.open(&ctx).await.unwrap();
        let err = op.next(&ctx).await.unwrap_err();
        assert!(matches!(err, FtsError::Timeout { .. }));
        assert!(!ctx.metadata.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_truncation_after_first_hit() {
        let mut adapter = ScriptedAdapter::new(&["http://a", "http://b", "http://c"]);
        adapter.hit_delay = Duration::from_millis(60);
        let ctx = ctx(adapter);
        let mut op = SearchOperator::new(call().with_timeout_ms(100));
        op.open(&ctx).await.unwrap();

        let rows = drain(&mut op, &ctx).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(op.is_partial());
        assert_eq!(op.state(), OperatorState::Closed);
        let warnings = ctx.metadata.warnings();
        assert!(matches!(
            warnings.as_slice(),
            [QueryWarning::PartialResults { rows: 1, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_hits_released_on_expiry() {
        let mut adapter = ScriptedAdapter::new(&["http://a", "not a uri", "http://b"]);
        adapter.hold = true;
        let ctx = ctx(adapter);
        let mut op = SearchOperator::new(call().with_timeout_ms(100));
        op.open(&ctx).await.unwrap();

        let rows = drain(&mut op, &ctx).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(VarId(0)), Some(&Binding::iri("http://b")));
        assert_eq!(op.hits_received(), 3);
        assert!(op.is_partial());
        assert_eq!(op.state(), OperatorState::Closed);
        assert!(matches!(
            ctx.metadata.warnings().as_slice(),
            [QueryWarning::PartialResults { rows: 2, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_with_nothing_held_is_timeout() {
        let mut adapter = ScriptedAdapter::new(&[]);
        adapter.hold = true;
        let ctx = ctx(adapter);
        let mut op = SearchOperator::new(call().with_timeout_ms(100));
        op.open(&ctx).await.unwrap();
        assert!(matches!(
            op.next(&ctx).await.unwrap_err(),
            FtsError::Timeout { .. }
        ));
        assert!(ctx.metadata.warnings().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_from_config() {
        let mut adapter = ScriptedAdapter::new(&["http://a"]);
        adapter.dispatch_delay = Duration::from_secs(5);
        let ctx = ExecutionContext::with_adapters(
            FtsConfig::default().with_default_timeout_ms(50),
            AdapterRegistry::new().with(adapter),
        );
        let mut op = SearchOperator::new(call());
        assert!(matches!(
            op.open(&ctx).await.unwrap_err(),
            FtsError::Timeout { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_stream() {
        let mut adapter = ScriptedAdapter::new(&["http://a", "http://b"]);
        adapter.hit_delay = Duration::from_secs(1);
        let (handle, token) = cancel_pair();
        let ctx = ctx(adapter).with_cancel(token);
        let mut op = SearchOperator::new(call());
        op.open(&ctx).await.unwrap();
        assert!(op.next(&ctx).await.unwrap().is_some());

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let err = op.next(&ctx).await.unwrap_err();
        assert!(matches!(err, FtsError::Cancelled));
        assert_eq!(op.state(), OperatorState::Failed);
        assert!(op.next(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_open_skips_dispatch() {
        let adapter = ScriptedAdapter::new(&["http://a"]);
        let dispatches = adapter.dispatches.clone();
        let (handle, token) = cancel_pair();
        handle.cancel();
        let ctx = ctx(adapter).with_cancel(token);
        let mut op = SearchOperator::new(call());
        assert!(matches!(
            op.open(&ctx).await.unwrap_err(),
            FtsError::Cancelled
        ));
        assert_eq!(dispatches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_adapter_error_fails_operator() {
        let mut adapter = ScriptedAdapter::new(&[]);
        adapter.fail_with = Some(|| FtsError::EndpointUnreachable("connection refused".into()));
        let ctx = ctx(adapter);
        let mut op = SearchOperator::new(call());
        let err = op.open(&ctx).await.unwrap_err();
        assert!(matches!(err, FtsError::EndpointUnreachable(_)));
        assert_eq!(op.state(), OperatorState::Failed);
        op.close();
        assert_eq!(op.state(), OperatorState::Failed);
    }

    #[tokio::test]
    async fn test_missing_endpoint() {
        let ctx = ctx(ScriptedAdapter::new(&[]));
        let mut op = SearchOperator::new(SearchCall::new(VarId(0), "blue"));
        assert!(matches!(
            op.open(&ctx).await.unwrap_err(),
            FtsError::BadEndpoint { .. }
        ));
    }

    #[tokio::test]
    async fn test_default_endpoint_from_config() {
        let ctx = ExecutionContext::with_adapters(
            FtsConfig::default().with_default_endpoint("http://h:1/solr"),
            AdapterRegistry::new().with(ScriptedAdapter::new(&["http://a"])),
        );
        let mut op = SearchOperator::new(SearchCall::new(VarId(0), "blue"));
        op.open(&ctx).await.unwrap();
        assert_eq!(drain(&mut op, &ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_endpoint_kind() {
        let ctx = ExecutionContext::with_adapters(FtsConfig::default(), AdapterRegistry::new());
        let mut op = SearchOperator::new(call());
        assert!(matches!(
            op.open(&ctx).await.unwrap_err(),
            FtsError::UnknownEndpointType(_)
        ));
    }
}
