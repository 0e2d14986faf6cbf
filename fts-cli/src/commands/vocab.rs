use crate::cli::OutputFormat;
use crate::error::CliResult;
use comfy_table::{ContentArrangement, Table};
use fts_vocab::{fts, EndpointKind, FtsPredicate, TargetKind};
use serde_json::json;

pub fn run(format: OutputFormat) -> CliResult<()> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&vocab_json())?,
        OutputFormat::Table => vocab_table(),
        OutputFormat::Csv => vocab_csv(),
    };
    println!("{out}");
    Ok(())
}

fn role(p: FtsPredicate) -> &'static str {
    if p.is_output() {
        "output"
    } else {
        "input"
    }
}

fn vocab_json() -> serde_json::Value {
    let predicates: Vec<_> = FtsPredicate::ALL
        .iter()
        .map(|p| json!({"name": p.to_string(), "iri": p.iri(), "role": role(*p)}))
        .collect();
    json!({
        "namespace": fts::NAMESPACE,
        "service": fts::SERVICE_IRI,
        "predicates": predicates,
        "endpointTypes": EndpointKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "targetTypes": TargetKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
    })
}

fn vocab_table() -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["predicate", "iri", "role"]);
    for p in FtsPredicate::ALL {
        table.add_row(vec![p.to_string(), p.iri().to_string(), role(p).to_string()]);
    }

    let kinds = |names: Vec<&str>| names.join(", ");
    format!(
        "{table}\nendpoint types: {}\ntarget types: {}",
        kinds(EndpointKind::ALL.iter().map(|k| k.as_str()).collect()),
        kinds(TargetKind::ALL.iter().map(|k| k.as_str()).collect()),
    )
}

fn vocab_csv() -> String {
    let mut lines = vec!["predicate,iri,role".to_string()];
    for p in FtsPredicate::ALL {
        lines.push(format!("{p},{},{}", p.iri(), role(p)));
    }
    lines.join("\n")
}
