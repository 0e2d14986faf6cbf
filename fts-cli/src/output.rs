use crate::cli::OutputFormat;
use crate::error::CliResult;
use comfy_table::{ContentArrangement, Table};
use fts_query::{Binding, BindingRow, QueryWarning, VarRegistry};
use serde_json::{json, Map, Value as JsonValue};

/// SPARQL 1.1 JSON results for one search call.
///
/// Warnings (truncated or endpoint-partial results) are attached under a
/// top-level `warnings` array when present.
pub fn sparql_json(
    head: &[String],
    rows: &[BindingRow],
    vars: &VarRegistry,
    warnings: &[QueryWarning],
) -> JsonValue {
    let bindings: Vec<JsonValue> = rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (name, binding) in row.named(vars) {
                if let Some(term) = binding_json(binding) {
                    obj.insert(name.to_string(), term);
                }
            }
            JsonValue::Object(obj)
        })
        .collect();

    let mut out = json!({
        "head": {"vars": head},
        "results": {"bindings": bindings},
    });
    if !warnings.is_empty() {
        out["warnings"] = warnings.iter().map(|w| w.to_string()).collect();
    }
    out
}

fn binding_json(binding: &Binding) -> Option<JsonValue> {
    match binding {
        Binding::Unbound => None,
        Binding::Iri(iri) => Some(json!({"type": "uri", "value": &**iri})),
        Binding::Plain(s) => Some(json!({"type": "literal", "value": &**s})),
        Binding::Double(_) => Some(json!({
            "type": "literal",
            "value": binding.lexical(),
            "datatype": binding.datatype(),
        })),
    }
}

/// Format a SPARQL JSON result for display.
pub fn format_result(json: &JsonValue, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(json)?),
        OutputFormat::Table => Ok(format_sparql_table(json)),
        OutputFormat::Csv => Ok(format_sparql_csv(json)),
    }
}

/// Escape a value for CSV output.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn head_vars(json: &JsonValue) -> Vec<String> {
    json.pointer("/head/vars")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn cell<'a>(row: &'a JsonValue, var: &str) -> &'a str {
    row.get(var)
        .and_then(|b| b.get("value"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn format_sparql_table(json: &JsonValue) -> String {
    let vars = head_vars(json);
    let rows = json
        .pointer("/results/bindings")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    if rows.is_empty() {
        return "(empty result set)".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(&vars);
    for row in rows {
        table.add_row(vars.iter().map(|var| cell(row, var)));
    }
    table.to_string()
}

fn format_sparql_csv(json: &JsonValue) -> String {
    let vars = head_vars(json);
    let mut lines = vec![vars
        .iter()
        .map(|v| csv_escape(v))
        .collect::<Vec<_>>()
        .join(",")];

    if let Some(rows) = json.pointer("/results/bindings").and_then(|v| v.as_array()) {
        for row in rows {
            let cells: Vec<String> = vars.iter().map(|var| csv_escape(cell(row, var))).collect();
            lines.push(cells.join(","));
        }
    }

    lines.join("\n")
}
