//! Search planning: fts magic predicates → [`Pattern::Search`]
//!
//! Detects, within each lexical scope:
//! - triples whose predicate is in the fts namespace, grouped by subject
//! - `SERVICE fts:search { ... }` blocks, each planned on its own
//!
//! and replaces every subject group with one validated [`SearchCall`] at
//! the position of the group's first pattern. Nested scopes (groups,
//! OPTIONAL) are planned independently; patterns outside the fts
//! vocabulary are returned untouched.

use std::collections::HashSet;

use fts_protocol::{SolrParams, WT_JSON, WT_PARAM};
use fts_vocab::{fts, xsd, EndpointKind, FtsPredicate, TargetKind};
use tracing::{debug, warn};

use crate::call::{parse_endpoint_url, SearchCall};
use crate::config::FtsConfig;
use crate::error::{FtsError, Result};
use crate::ir::Pattern;
use crate::operator::BoxedOperator;
use crate::pattern::{Term, TriplePattern};
use crate::search::SearchOperator;
use crate::var_registry::{VarId, VarRegistry};

/// Planner output: the rewritten scope
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub patterns: Vec<Pattern>,
}

impl SearchPlan {
    /// Every planned call, in pattern order, including nested scopes
    pub fn calls(&self) -> Vec<&SearchCall> {
        let mut out = Vec::new();
        collect_calls(&self.patterns, &mut out);
        out
    }

    /// Variables bound by the planned calls
    pub fn produced_vars(&self) -> Vec<VarId> {
        let mut seen = HashSet::new();
        self.calls()
            .into_iter()
            .flat_map(|c| c.output_vars())
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// One operator per planned call
    pub fn into_operators(self, vars: &VarRegistry) -> Vec<BoxedOperator> {
        self.calls()
            .into_iter()
            .map(|call| {
                let op = SearchOperator::new(call.clone()).with_label(vars.name(call.subject));
                Box::new(op) as BoxedOperator
            })
            .collect()
    }
}

fn collect_calls<'a>(patterns: &'a [Pattern], out: &mut Vec<&'a SearchCall>) {
    for p in patterns {
        match p {
            Pattern::Search(call) => out.push(call),
            Pattern::Group(inner) | Pattern::Optional(inner) => collect_calls(inner, out),
            Pattern::Triple(_) | Pattern::Service(_) => {}
        }
    }
}

/// Plan a scope with no externally bound variables
pub fn plan_search(patterns: Vec<Pattern>, vars: &VarRegistry) -> Result<SearchPlan> {
    SearchPlanner::new(vars).plan(patterns)
}

/// Search planner
pub struct SearchPlanner<'a> {
    vars: &'a VarRegistry,
    /// Variables already bound when the scope is entered
    bound: HashSet<VarId>,
    /// Endpoint kind for calls without fts:endpointType
    default_kind: EndpointKind,
}

impl<'a> SearchPlanner<'a> {
    pub fn new(vars: &'a VarRegistry) -> Self {
        Self {
            vars,
            bound: HashSet::new(),
            default_kind: fts_vocab::defaults::ENDPOINT_KIND,
        }
    }

    /// Take process-wide defaults from configuration
    pub fn with_config(mut self, config: &FtsConfig) -> Self {
        self.default_kind = config.default_endpoint_kind;
        self
    }

    /// Mark variables as bound at entry (VALUES, outer solutions)
    pub fn with_bound(mut self, bound: impl IntoIterator<Item = VarId>) -> Self {
        self.bound.extend(bound);
        self
    }

    pub fn plan(&self, patterns: Vec<Pattern>) -> Result<SearchPlan> {
        let patterns = self.plan_scope(patterns)?;
        Ok(SearchPlan { patterns })
    }

    fn plan_scope(&self, patterns: Vec<Pattern>) -> Result<Vec<Pattern>> {
        // 1. Nested scopes first
        let patterns = patterns
            .into_iter()
            .map(|p| match p {
                Pattern::Group(inner) => self.plan_scope(inner).map(Pattern::Group),
                Pattern::Optional(inner) => self.plan_scope(inner).map(Pattern::Optional),
                other => Ok(other),
            })
            .collect::<Result<Vec<_>>>()?;

        // 2. Group fts triples by subject within this scope
        let mut groups: Vec<SubjectGroup> = Vec::new();
        let mut slots: Vec<Slot> = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            match pattern {
                Pattern::Triple(tp) if tp.predicate_iri().is_some_and(fts::is_fts_iri) => {
                    let (pred, subject, object) = fts_triple(tp)?;
                    match groups
                        .iter_mut()
                        .position(|g| g.block.is_none() && g.subject == subject)
                    {
                        Some(idx) => groups[idx].triples.push((pred, object)),
                        None => {
                            slots.push(Slot::Call(groups.len()));
                            groups.push(SubjectGroup {
                                subject,
                                block: None,
                                triples: vec![(pred, object)],
                            });
                        }
                    }
                }
                Pattern::Service(sp) if sp.endpoint_iri() == Some(fts::SERVICE_IRI) => {
                    let block = slots.len();
                    if sp.silent {
                        debug!("SILENT has no effect on fts:search blocks");
                    }
                    for inner in sp.patterns {
                        let tp = match inner {
                            Pattern::Triple(tp)
                                if tp.predicate_iri().is_some_and(fts::is_fts_iri) =>
                            {
                                tp
                            }
                            _ => {
                                return Err(FtsError::InvalidVocabulary(
                                    "SERVICE fts:search may only contain fts triple patterns"
                                        .to_string(),
                                ))
                            }
                        };
                        let (pred, subject, object) = fts_triple(tp)?;
                        match groups
                            .iter_mut()
                            .position(|g| g.block == Some(block) && g.subject == subject)
                        {
                            Some(idx) => groups[idx].triples.push((pred, object)),
                            None => {
                                slots.push(Slot::Call(groups.len()));
                                groups.push(SubjectGroup {
                                    subject,
                                    block: Some(block),
                                    triples: vec![(pred, object)],
                                });
                            }
                        }
                    }
                }
                other => slots.push(Slot::Keep(other)),
            }
        }

        if groups.is_empty() {
            return Ok(slots
                .into_iter()
                .filter_map(|s| match s {
                    Slot::Keep(p) => Some(p),
                    Slot::Call(_) => None,
                })
                .collect());
        }

        // 3. Validate each group into a call
        let mut calls: Vec<Option<SearchCall>> = groups
            .iter()
            .map(|g| self.build_call(g).map(Some))
            .collect::<Result<_>>()?;

        // 4. Output variables must be fresh in this scope
        let residual_vars: HashSet<VarId> = slots
            .iter()
            .filter_map(|s| match s {
                Slot::Keep(p) => Some(p.variables()),
                Slot::Call(_) => None,
            })
            .flatten()
            .collect();
        self.check_fresh(&calls, &residual_vars)?;

        debug!(calls = calls.len(), "planned fts search calls");

        Ok(slots
            .into_iter()
            .filter_map(|s| match s {
                Slot::Keep(p) => Some(p),
                Slot::Call(idx) => calls[idx].take().map(Pattern::Search),
            })
            .collect())
    }

    fn build_call(&self, group: &SubjectGroup) -> Result<SearchCall> {
        let subject = match &group.subject {
            Term::Var(v) if !self.bound.contains(v) => *v,
            other => {
                return Err(FtsError::BoundSubject {
                    subject: self.describe(other),
                })
            }
        };
        let subject_name = self.vars.name(subject).to_string();

        let objects = |pred: FtsPredicate| -> Vec<&Term> {
            group
                .triples
                .iter()
                .filter(|(p, _)| *p == pred)
                .map(|(_, o)| o)
                .collect()
        };

        let query = match objects(FtsPredicate::Search).as_slice() {
            [] => {
                return Err(FtsError::MissingSearch {
                    subject: subject_name,
                })
            }
            [term] => string_object(FtsPredicate::Search, term)?,
            _ => {
                return Err(FtsError::DuplicateSearch {
                    subject: subject_name,
                })
            }
        };

        let mut call = SearchCall::new(subject, query).with_endpoint_kind(self.default_kind);
        for pred in FtsPredicate::ALL {
            if pred == FtsPredicate::Search {
                continue;
            }
            let term = match objects(pred).as_slice() {
                [] => continue,
                [term] => *term,
                _ => {
                    return Err(FtsError::InvalidVocabulary(format!(
                        "{pred} given more than once for subject {subject_name}"
                    )))
                }
            };
            self.apply(&mut call, pred, term)?;
        }

        // params are checked once the endpoint type is known
        if let Some(raw) = &call.params {
            validate_params(call.endpoint_kind, raw)?;
        }

        if call.score_var == Some(subject) || call.snippet_var == Some(subject) {
            return Err(FtsError::InvalidVocabulary(format!(
                "output variable must differ from the subject {subject_name}"
            )));
        }
        if call.score_var.is_some() && call.score_var == call.snippet_var {
            return Err(FtsError::InvalidVocabulary(
                "fts:score and fts:snippet must bind different variables".to_string(),
            ));
        }

        Ok(call)
    }

    fn apply(&self, call: &mut SearchCall, pred: FtsPredicate, term: &Term) -> Result<()> {
        match pred {
            FtsPredicate::Search => {}
            FtsPredicate::Endpoint => {
                let raw = match term {
                    Term::Literal(lit) => lit.lexical.to_string(),
                    Term::Iri(iri) => iri.to_string(),
                    Term::Var(_) => {
                        return Err(FtsError::BadEndpoint {
                            endpoint: self.describe(term),
                            reason: "must be a constant".to_string(),
                        })
                    }
                };
                let url = parse_endpoint_url(&raw).map_err(|reason| FtsError::BadEndpoint {
                    endpoint: raw.clone(),
                    reason,
                })?;
                call.endpoint = Some(url);
            }
            FtsPredicate::EndpointType => {
                let raw = string_object(pred, term)?;
                call.endpoint_kind = raw
                    .parse::<EndpointKind>()
                    .map_err(|_| FtsError::UnknownEndpointType(raw))?;
            }
            FtsPredicate::Params => {
                call.params = Some(string_object(pred, term)?);
            }
            FtsPredicate::TargetType => {
                let raw = string_object(pred, term)?;
                call.target = raw.parse::<TargetKind>().unwrap_or_else(|_| {
                    warn!(target_type = %raw, "unknown fts:targetType, using {}", call.target);
                    call.target
                });
            }
            FtsPredicate::Timeout => {
                call.timeout_ms = timeout_ms(term);
                if call.timeout_ms.is_none() {
                    warn!(timeout = %term, "unusable fts:timeout, using the default");
                }
            }
            FtsPredicate::Score | FtsPredicate::Snippet => {
                let var = term.as_var().ok_or_else(|| {
                    FtsError::InvalidVocabulary(format!("{pred} object must be a variable"))
                })?;
                if pred == FtsPredicate::Score {
                    call.score_var = Some(var);
                } else {
                    call.snippet_var = Some(var);
                }
            }
        }
        Ok(())
    }

    fn check_fresh(
        &self,
        calls: &[Option<SearchCall>],
        residual_vars: &HashSet<VarId>,
    ) -> Result<()> {
        for (i, call) in calls.iter().flatten().enumerate() {
            for var in call.score_var.into_iter().chain(call.snippet_var) {
                let clash = self.bound.contains(&var)
                    || residual_vars.contains(&var)
                    || calls
                        .iter()
                        .flatten()
                        .enumerate()
                        .any(|(j, other)| j != i && other.output_vars().contains(&var));
                if clash {
                    return Err(FtsError::InvalidVocabulary(format!(
                        "{} is bound elsewhere; fts:score and fts:snippet need fresh variables",
                        self.vars.name(var)
                    )));
                }
            }
        }
        Ok(())
    }

    fn describe(&self, term: &Term) -> String {
        match term {
            Term::Var(v) => self
                .vars
                .try_name(*v)
                .map(str::to_string)
                .unwrap_or_else(|| term.to_string()),
            other => other.to_string(),
        }
    }
}

/// fts triples that share a subject; `block` identifies the SERVICE
/// block they came from
struct SubjectGroup {
    subject: Term,
    block: Option<usize>,
    triples: Vec<(FtsPredicate, Term)>,
}

enum Slot {
    Keep(Pattern),
    Call(usize),
}

fn fts_triple(tp: TriplePattern) -> Result<(FtsPredicate, Term, Term)> {
    let iri = tp.predicate_iri().unwrap_or_default();
    let pred = FtsPredicate::from_iri(iri).ok_or_else(|| {
        FtsError::InvalidVocabulary(format!("unknown predicate <{iri}> in the fts namespace"))
    })?;
    Ok((pred, tp.s, tp.o))
}

fn string_object(pred: FtsPredicate, term: &Term) -> Result<String> {
    match term {
        Term::Literal(lit) if lit.is_string() => Ok(lit.lexical.to_string()),
        _ => Err(FtsError::InvalidVocabulary(format!(
            "{pred} object must be a string literal, got {term}"
        ))),
    }
}

/// Non-negative integer milliseconds, from a string or integer literal
fn timeout_ms(term: &Term) -> Option<u64> {
    let lit = term.as_literal()?;
    let dt = lit.datatype_iri();
    if dt != xsd::STRING && !xsd::is_integer_family(dt) {
        return None;
    }
    lit.lexical.trim().parse::<u64>().ok()
}

fn validate_params(kind: EndpointKind, raw: &str) -> Result<()> {
    match kind {
        EndpointKind::Solr => {
            let params = SolrParams::parse(raw)?;
            if params.contains_key("q") {
                return Err(FtsError::BadParams(
                    "'q' is reserved for the fts:search string".to_string(),
                ));
            }
            if let Some(wt) = params.get(WT_PARAM) {
                if wt != WT_JSON {
                    return Err(FtsError::BadParams(format!(
                        "response writer '{wt}' is not supported; only wt=json"
                    )));
                }
            }
            Ok(())
        }
    }
}
