use crate::cli::SearchArgs;
use crate::error::{CliError, CliResult};
use crate::output::{format_result, sparql_json};
use colored::Colorize;
use fts_query::{
    cancel_pair, collect_rows, ExecutionContext, FtsConfig, Literal, Pattern, SearchPlanner,
    ServiceEndpoint, ServicePattern, Term, TriplePattern, VarRegistry,
};
use fts_vocab::{fts, xsd};

const SUBJECT_VAR: &str = "?res";
const SCORE_VAR: &str = "?score";
const SNIPPET_VAR: &str = "?snippet";

pub async fn run(args: &SearchArgs) -> CliResult<()> {
    if args.query.trim().is_empty() {
        return Err(CliError::Usage("search text must not be empty".into()));
    }

    let config = FtsConfig::from_env()?;
    let mut vars = VarRegistry::new();
    let patterns = build_patterns(args, &mut vars);
    let plan = SearchPlanner::new(&vars).with_config(&config).plan(patterns)?;

    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    let ctx = ExecutionContext::new(config)?.with_cancel(token);

    let mut head = Vec::new();
    let mut rows = Vec::new();
    for mut op in plan.into_operators(&vars) {
        head.extend(op.schema().iter().map(|&v| vars.bare_name(v).to_string()));
        rows.extend(collect_rows(op.as_mut(), &ctx).await?);
    }
    tracing::info!(rows = rows.len(), "search complete");

    let warnings = ctx.metadata.warnings();
    let json = sparql_json(&head, &rows, &vars, &warnings);
    println!("{}", format_result(&json, args.format)?);

    // JSON output carries the warnings inline
    if args.format != crate::cli::OutputFormat::Json {
        for warning in &warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
    }
    Ok(())
}

/// The fts triples a query would contain for these arguments.
fn build_patterns(args: &SearchArgs, vars: &mut VarRegistry) -> Vec<Pattern> {
    let subject = Term::Var(vars.get_or_insert(SUBJECT_VAR));
    let triple = |pred: &str, o: Term| {
        Pattern::Triple(TriplePattern::new(subject.clone(), Term::iri(pred), o))
    };
    let plain = |s: &str| Term::Literal(Literal::plain(s));

    let mut patterns = vec![triple(fts::SEARCH, plain(&args.query))];
    if let Some(endpoint) = &args.endpoint {
        patterns.push(triple(fts::ENDPOINT, plain(endpoint)));
    }
    if let Some(kind) = &args.endpoint_type {
        patterns.push(triple(fts::ENDPOINT_TYPE, plain(kind)));
    }
    if let Some(params) = &args.params {
        patterns.push(triple(fts::PARAMS, plain(params)));
    }
    if let Some(target) = &args.target_type {
        patterns.push(triple(fts::TARGET_TYPE, plain(target)));
    }
    if let Some(ms) = args.timeout {
        patterns.push(triple(
            fts::TIMEOUT,
            Term::Literal(Literal::typed(ms.to_string(), xsd::INTEGER)),
        ));
    }
    if args.score {
        patterns.push(triple(fts::SCORE, Term::Var(vars.get_or_insert(SCORE_VAR))));
    }
    if args.snippet {
        patterns.push(triple(fts::SNIPPET, Term::Var(vars.get_or_insert(SNIPPET_VAR))));
    }

    if args.service {
        vec![Pattern::Service(ServicePattern::new(
            false,
            ServiceEndpoint::Iri(fts::SERVICE_IRI.into()),
            patterns,
        ))]
    } else {
        patterns
    }
}
