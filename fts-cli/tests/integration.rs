use assert_cmd::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `fts` command with no ambient FTS_* configuration.
fn fts_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("fts");
    for var in [
        "FTS_DEFAULT_ENDPOINT",
        "FTS_DEFAULT_ENDPOINT_TYPE",
        "FTS_DEFAULT_TIMEOUT_MS",
        "FTS_CONNECT_TIMEOUT_MS",
        "FTS_SOLR_ID_FIELD",
        "FTS_SOLR_SCORE_FIELD",
        "FTS_SOLR_SNIPPET_FIELD",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

async fn solr_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solr/select"))
        .and(query_param("q", "blue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseHeader": {"status": 0, "QTime": 1},
            "response": {"numFound": 2, "start": 0, "docs": [
                {"id": "http://a", "score": 0.9},
                {"id": "http://b", "score": 0.5},
            ]},
        })))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Happy path tests
// ============================================================================

#[test]
fn help_flag() {
    fts_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("External full-text search CLI"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("vocab"));
}

#[test]
fn version_flag() {
    fts_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fts"));
}

#[test]
fn vocab_lists_predicates() {
    fts_cmd()
        .args(["vocab", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "fts:search,http://www.bigdata.com/rdf/fts#search,input",
        ))
        .stdout(predicate::str::contains("fts:snippet"));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_prints_sparql_json() {
    let server = solr_server().await;
    let endpoint = format!("{}/solr", server.uri());

    let output = fts_cmd()
        .args(["search", "blue", "--score", "--endpoint", &endpoint])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["head"]["vars"], json!(["res", "score"]));
    let bindings = json["results"]["bindings"].as_array().unwrap();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0]["res"], json!({"type": "uri", "value": "http://a"}));
    assert_eq!(bindings[0]["score"]["value"], "0.9");
    assert_eq!(
        bindings[0]["score"]["datatype"],
        "http://www.w3.org/2001/XMLSchema#double"
    );
    assert_eq!(bindings[1]["res"]["value"], "http://b");
}

#[tokio::test(flavor = "multi_thread")]
async fn search_uses_default_endpoint_env() {
    let server = solr_server().await;

    fts_cmd()
        .env("FTS_DEFAULT_ENDPOINT", format!("{}/solr", server.uri()))
        .args(["search", "blue", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("res\nhttp://a\nhttp://b"));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_literal_target_table() {
    let server = solr_server().await;
    let endpoint = format!("{}/solr", server.uri());

    fts_cmd()
        .args([
            "search",
            "blue",
            "--endpoint",
            &endpoint,
            "--target-type",
            "LITERAL",
            "--service",
            "--format",
            "table",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://a"))
        .stdout(predicate::str::contains("res"));
}

// ============================================================================
// Error cases
// ============================================================================

#[test]
fn verbose_quiet_conflict() {
    fts_cmd()
        .args(["--verbose", "--quiet", "vocab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn search_without_endpoint_errors() {
    fts_cmd()
        .args(["search", "blue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("FTS_DEFAULT_ENDPOINT"));
}

#[test]
fn search_empty_query_errors() {
    fts_cmd()
        .args(["search", "  ", "--endpoint", "http://127.0.0.1:9/solr"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn search_unknown_endpoint_type_errors() {
    fts_cmd()
        .args([
            "search",
            "blue",
            "--endpoint",
            "http://127.0.0.1:9/solr",
            "--endpoint-type",
            "elastic",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown fts:endpointType 'elastic'"));
}

#[test]
fn search_bad_params_errors() {
    fts_cmd()
        .args([
            "search",
            "blue",
            "--endpoint",
            "http://127.0.0.1:9/solr",
            "--params",
            "q=other",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fts:params"));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_rejected_by_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solr/select"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"msg": "org.apache.solr.search.SyntaxError: bad query", "code": 400},
        })))
        .mount(&server)
        .await;
    let endpoint = format!("{}/solr", server.uri());

    fts_cmd()
        .args(["search", "blue AND", "--endpoint", &endpoint])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("rejected the request (400)"))
        .stderr(predicate::str::contains("SyntaxError"));
}
