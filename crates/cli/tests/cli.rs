// ABOUTME: Integration tests for the curator CLI binary.
// ABOUTME: Tests filtering from files, enrichment from a detail table, and error reporting.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn curator_cmd() -> Command {
    Command::cargo_bin("curator").unwrap()
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

const RECORDS: &str = r#"[
  {"id": "1", "tags": "rock, pop", "edad": "TP", "tipo": "video", "resolucion": "1080"},
  {"id": "2", "tag_list": ["jazz"], "edadvisualizacion": "18", "type": "Audio"},
  {"id": "3", "tipo": "video"}
]"#;

fn item_ids(stdout: &[u8]) -> Vec<String> {
    let out: Value = serde_json::from_slice(stdout).unwrap();
    out["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn filters_records_by_criteria_file() {
    let dir = TempDir::new().unwrap();
    let records = write(&dir, "records.json", RECORDS);
    let criteria = write(&dir, "criteria.json", r#"{"tags": ["Rock"]}"#);

    let output = curator_cmd()
        .arg(&records)
        .arg("--criteria")
        .arg(&criteria)
        .arg("--compact")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(item_ids(&output.stdout), vec!["1"]);
}

#[test]
fn enriches_from_details_file() {
    let dir = TempDir::new().unwrap();
    let records = write(&dir, "records.json", RECORDS);
    let criteria = write(&dir, "criteria.json", r#"{"tags": ["rock"], "age": "all_ages"}"#);
    let details = write(
        &dir,
        "details.json",
        r#"{"3": {"tags": ["rock"], "edad": 0}, "2": null}"#,
    );

    let output = curator_cmd()
        .arg(&records)
        .arg("--criteria")
        .arg(&criteria)
        .arg("--details")
        .arg(&details)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(item_ids(&output.stdout), vec!["1", "3"]);
    let out: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(out["enrichment_requested"], serde_json::json!(["3"]));
}

#[test]
fn normalize_only_prints_summaries() {
    let dir = TempDir::new().unwrap();
    let records = write(&dir, "records.json", RECORDS);

    curator_cmd()
        .arg(&records)
        .arg("--normalize-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"audio\""))
        .stdout(predicate::str::contains("\"resolution\": \"1080p\""));
}

#[test]
fn reads_records_from_stdin() {
    curator_cmd()
        .arg("-")
        .write_stdin(r#"[{"id": "x", "tipo": "audio"}]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"x\""));
}

#[test]
fn rejects_non_array_records() {
    let dir = TempDir::new().unwrap();
    let records = write(&dir, "records.json", r#"{"id": "1"}"#);

    curator_cmd()
        .arg(&records)
        .assert()
        .failure()
        .stderr(predicate::str::contains("records must be a JSON array"));
}

#[test]
fn missing_file_is_reported() {
    curator_cmd()
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}
