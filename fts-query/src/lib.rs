//! Full-text search over external ranked search services, as a SPARQL
//! evaluation operator.
//!
//! A query names a search with magic predicates in the
//! `http://www.bigdata.com/rdf/fts#` namespace:
//!
//! ```sparql
//! PREFIX fts: <http://www.bigdata.com/rdf/fts#>
//! SELECT ?res ?score WHERE {
//!   ?res fts:search "blue !red" .
//!   ?res fts:endpoint "http://localhost:8983/solr/books" .
//!   ?res fts:score ?score .
//! }
//! ```
//!
//! The [`planner`] collects those triples (top-level, or inside a
//! `SERVICE fts:search { ... }` block) into a [`SearchCall`] per subject
//! and replaces them with [`Pattern::Search`]. Each call then runs as a
//! [`SearchOperator`]: it dispatches one request through the
//! [`EndpointAdapter`] registered for its endpoint type and streams one
//! [`BindingRow`] per hit, in the endpoint's order, under the call's
//! deadline and the query's cancel token.
//!
//! # Example
//!
//! ```ignore
//! let plan = plan_search(patterns, &vars)?;
//! let ctx = ExecutionContext::new(FtsConfig::from_env()?)?;
//! for mut op in plan.into_operators(&vars) {
//!     let rows = collect_rows(op.as_mut(), &ctx).await?;
//!     // ...
//! }
//! ```

pub mod adapter;
pub mod binding;
pub mod call;
pub mod config;
pub mod context;
pub mod deadline;
pub mod error;
pub mod ir;
pub mod operator;
pub mod pattern;
pub mod planner;
pub mod projector;
pub mod search;
pub mod var_registry;

pub use adapter::{
    AdapterRegistry, BoxedHitStream, DispatchRequest, EndpointAdapter, HitStream, SolrAdapter,
};
pub use binding::{Binding, BindingRow};
pub use call::SearchCall;
pub use config::FtsConfig;
pub use context::{ExecutionContext, QueryWarning, ResultMetadata};
pub use deadline::{cancel_pair, CancelHandle, CancelToken, Deadline};
pub use error::{FailureClass, FtsError, Result};
pub use ir::{Pattern, ServiceEndpoint, ServicePattern};
pub use operator::{collect_rows, BoxedOperator, Operator, OperatorState};
pub use pattern::{Literal, Term, TriplePattern};
pub use planner::{plan_search, SearchPlan, SearchPlanner};
pub use projector::Projector;
pub use search::SearchOperator;
pub use var_registry::{VarId, VarRegistry};

pub use fts_protocol::SearchHit;
pub use fts_vocab::{EndpointKind, TargetKind};
