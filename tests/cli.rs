mod common;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestWorkspace, fixture_path};
use predicates::str::contains;
use serde_json::{Value, json};
use shape_probe::{
    probe::ContainerDescription,
    schema::SchemaNode,
    value::Subtype,
};

fn probe_to(output: &std::path::Path, extra: &[&str]) {
    let input = fixture_path("warehouse.yml");
    let mut args = vec![
        "probe",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    cargo_bin_cmd!("shape-probe").args(args).assert().success();
}

#[test]
fn probe_writes_json_document_for_every_container() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("schema.json");
    probe_to(&output, &[]);

    let contents = fs::read_to_string(&output).expect("read output");
    let described: Vec<ContainerDescription> =
        serde_json::from_str(&contents).expect("parse output");
    assert_eq!(described.len(), 2);

    let events = &described[0].tables[0];
    assert_eq!(events.name, "EVENTS");
    assert_eq!(events.sampled_rows, 3);
    assert_eq!(events.schema.node("ID"), Some(&SchemaNode::Scalar));
    assert_eq!(
        events.schema.node("PAYLOAD").and_then(SchemaNode::subtype),
        Some(Subtype::Object)
    );
    let tags = events
        .schema
        .node("TAGS")
        .and_then(SchemaNode::items)
        .expect("tags items");
    assert_eq!(tags.len(), 2);

    let meta = events
        .schema
        .node("META")
        .and_then(SchemaNode::properties)
        .expect("meta properties");
    let mut keys = meta.keys().cloned().collect::<Vec<_>>();
    keys.sort();
    assert_eq!(keys, vec!["geo", "retries", "source"]);

    let key = events.clustering_key.as_ref().expect("clustering key");
    assert_eq!(key.len(), 2);
    assert_eq!(key[1].expression, "SUBSTRING(${name},1,3)");

    let users = &described[0].tables[1];
    assert_eq!(users.schema.node("PROFILE"), Some(&SchemaNode::bare_variant(None)));
    assert!(users.clustering_key.is_none());
}

#[test]
fn probe_honours_sample_rows_and_table_selection() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("events.yaml");
    probe_to(&output, &["--sample-rows", "1", "--table", "PUBLIC.EVENTS"]);

    let contents = fs::read_to_string(&output).expect("read output");
    let described: Vec<ContainerDescription> =
        serde_yaml::from_str(&contents).expect("parse yaml output");
    assert_eq!(described.len(), 1);
    assert_eq!(described[0].tables.len(), 1);
    let events = &described[0].tables[0];
    assert_eq!(events.sampled_rows, 1);
    assert_eq!(
        events.schema.node("PAYLOAD").and_then(SchemaNode::subtype),
        Some(Subtype::Number)
    );
}

#[test]
fn probe_expands_variant_objects_when_requested() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("expanded.json");
    probe_to(&output, &["--expand-variant-objects", "-t", "PUBLIC.EVENTS"]);

    let document: Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("read output"))
            .expect("parse output");
    let payload = &document[0]["tables"][0]["columns"][1];
    assert_eq!(payload["name"], "PAYLOAD");
    assert_eq!(
        payload["schema"]["child"]["properties"]["kind"],
        json!({"type": "variant", "subtype": "string"})
    );
}

#[test]
fn probe_reads_snapshot_from_stdin() {
    let snapshot = json!({
        "containers": [{
            "name": "S",
            "tables": [{
                "name": "T",
                "columns": [{"name": "V", "type": "variant"}],
                "rows": [{"V": [1]}]
            }]
        }]
    });
    cargo_bin_cmd!("shape-probe")
        .args(["probe", "-i", "-"])
        .write_stdin(snapshot.to_string())
        .assert()
        .success()
        .stdout(contains("\"subtype\": \"array\""));
}

#[test]
fn probe_rejects_unknown_table_selector() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("never.json");
    cargo_bin_cmd!("shape-probe")
        .args([
            "probe",
            "-i",
            fixture_path("warehouse.yml").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--table",
            "PUBLIC.MISSING",
        ])
        .assert()
        .failure()
        .stderr(contains("PUBLIC.MISSING"));
    assert!(!output.exists());
}

#[test]
fn probe_reports_malformed_snapshot() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("broken.json", "{\"containers\": [");
    cargo_bin_cmd!("shape-probe")
        .args(["probe", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Parsing JSON document"));
}

#[test]
fn cluster_key_prints_segments() {
    cargo_bin_cmd!("shape-probe")
        .args([
            "cluster-key",
            "--expression",
            "LINEAR(A, SUBSTRING(B,1,3))",
            "--columns",
            "A,B",
        ])
        .assert()
        .success()
        .stdout(contains("\"clusteringKey\""))
        .stdout(contains("SUBSTRING(${name},1,3)"));
}

#[test]
fn cluster_key_blank_expression_prints_null() {
    cargo_bin_cmd!("shape-probe")
        .args(["cluster-key", "--expression", " ", "--columns", "A"])
        .assert()
        .success()
        .stdout(contains("null"));
}

#[test]
fn preview_lists_flattened_paths() {
    cargo_bin_cmd!("shape-probe")
        .args([
            "preview",
            "-i",
            fixture_path("warehouse.yml").to_str().unwrap(),
            "--table",
            "PUBLIC.EVENTS",
        ])
        .assert()
        .success()
        .stdout(contains("PUBLIC.EVENTS"))
        .stdout(contains("META.source"))
        .stdout(contains("variant<object>"));
}
